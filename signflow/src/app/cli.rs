//! Command-Line Interface

use crate::lesson::Language;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SignFlow - Sign language practice with AI gesture feedback
#[derive(Parser, Debug)]
#[command(name = "signflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the lesson catalog
    Lessons {
        /// List the full alphabet used by the name game
        #[arg(short, long)]
        alphabet: bool,

        /// Language for labels (en, es)
        #[arg(long)]
        lang: Option<Language>,
    },

    /// Validate a single image against a lesson
    Validate {
        /// Image file (PNG or JPEG)
        #[arg(short, long)]
        image: PathBuf,

        /// Lesson id, e.g. "a" or "hello"
        #[arg(short, long)]
        lesson: String,

        /// Feedback language (en, es)
        #[arg(long)]
        lang: Option<Language>,

        /// Print the result and debug record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a practice session over a replayed camera feed
    Practice {
        /// Directory of frames with optional .hands.json / .mask.png sidecars
        #[arg(short, long)]
        frames: PathBuf,

        /// Spell this name instead of following the lessons
        #[arg(short, long)]
        game: Option<String>,

        /// Session language (en, es)
        #[arg(long)]
        lang: Option<Language>,

        /// Disable auto-validation; validate the last frame once the feed ends
        #[arg(long)]
        no_auto: bool,

        /// Background blur radius (0 disables)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=30))]
        blur: Option<u32>,

        /// Write composited frames to this directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Delay between replayed frames in milliseconds
        #[arg(long, default_value = "33")]
        frame_interval_ms: u64,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "validator.model", "session.cooldown_ms")
        key: String,

        /// Value to set
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default directory for composited practice frames
    pub fn output_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".signflow").join("frames"))
            .unwrap_or_else(|| PathBuf::from("frames"))
    }
}
