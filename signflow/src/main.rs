//! SignFlow - sign language practice loop
//!
//! Lists lessons, validates single images, and runs practice sessions over a
//! replayed camera feed.

use anyhow::Context;
use image::RgbaImage;
use signflow::app::cli::{Cli, Commands, ConfigAction};
use signflow::app::config::Config;
use signflow::lesson::{Catalog, Language};
use signflow::pipeline::{
    DisplaySurface, FramePipeline, LiveSettings, PipelineStatus, ReplayFeed, ReplayHandTracker, ReplaySegmenter,
    SharedSurface, Snapshot,
};
use signflow::session::{SessionView, TriggerOrigin, ValidationSession};
use signflow::shell::{render_text, SessionStorage, ViewModel};
use signflow::validator::{GeminiValidator, SignValidator};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a local .env file
    let _ = dotenvy::dotenv();

    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Lessons { alphabet, lang } => {
            run_lessons(alphabet, lang, &config)?;
        }
        Commands::Validate {
            image,
            lesson,
            lang,
            json,
        } => {
            run_validate(&image, &lesson, lang, json, &config).await?;
        }
        Commands::Practice {
            frames,
            game,
            lang,
            no_auto,
            blur,
            output,
            frame_interval_ms,
        } => {
            let options = PracticeOptions {
                frames,
                game,
                lang,
                no_auto,
                blur,
                output,
                frame_interval: Duration::from_millis(frame_interval_ms),
            };
            run_practice(options, &config).await?;
        }
        Commands::Init { force } => {
            run_init(force, &config_path, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config_path, &config)?;
        }
    }

    Ok(())
}

fn load_catalog(config: &Config) -> anyhow::Result<Catalog> {
    match &config.ui.catalog_path {
        Some(path) => Catalog::load(path).with_context(|| format!("loading lessons from {}", path.display())),
        None => Ok(Catalog::default_lessons()),
    }
}

fn run_lessons(alphabet: bool, lang: Option<Language>, config: &Config) -> anyhow::Result<()> {
    let language = lang.unwrap_or(config.ui.default_language);
    let catalog = if alphabet { Catalog::alphabet() } else { load_catalog(config)? };

    println!("Lessons ({}):", language.display_name());
    for (i, lesson) in catalog.iter().enumerate() {
        println!("  {:>2}. {:<8} {}", i + 1, lesson.id, lesson.label.get(language));
        println!("      {}", lesson.description.get(language));
    }
    Ok(())
}

async fn run_validate(
    image: &Path,
    lesson_id: &str,
    lang: Option<Language>,
    json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let language = lang.unwrap_or(config.ui.default_language);
    let catalog = load_catalog(config)?;
    let alphabet = Catalog::alphabet();
    let lesson = catalog
        .find(lesson_id)
        .or_else(|| alphabet.find(lesson_id))
        .ok_or_else(|| anyhow::anyhow!("Lesson '{}' not found. Run 'signflow lessons' to list them.", lesson_id))?;

    let frame = image::open(image)
        .with_context(|| format!("reading {}", image.display()))?
        .to_rgba8();
    let snapshot = Snapshot::from_image(&frame, config.pipeline.snapshot_quality)?;

    let validator = GeminiValidator::from_config(&config.validator)?;
    let response = validator.validate(&snapshot, lesson, language).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let result = &response.validation;
    println!("{} - {}", lesson.label.get(language), if result.is_valid { "VALID" } else { "NOT VALID" });
    println!("  Confidence: {:.0}%", result.confidence * 100.0);
    println!("  Feedback:   {}", result.feedback);
    for suggestion in &result.suggestions {
        println!("  - {}", suggestion);
    }
    println!("  Latency:    {} ms", response.debug.latency_ms);
    if let Some(error) = &response.debug.error {
        println!("  Error:      {}", error);
    }
    Ok(())
}

struct PracticeOptions {
    frames: PathBuf,
    game: Option<String>,
    lang: Option<Language>,
    no_auto: bool,
    blur: Option<u32>,
    output: Option<PathBuf>,
    frame_interval: Duration,
}

/// Display surface that also writes each composited frame to disk
struct RecordingSurface {
    surface: SharedSurface,
    output_dir: Option<PathBuf>,
    written: AtomicU64,
}

impl DisplaySurface for RecordingSurface {
    fn present(&self, frame: RgbaImage) {
        if let Some(dir) = &self.output_dir {
            let index = self.written.fetch_add(1, Ordering::Relaxed);
            let path = dir.join(format!("frame_{:05}.png", index));
            if let Err(e) = frame.save(&path) {
                warn!(path = %path.display(), error = %e, "Failed to write composited frame");
            }
        }
        self.surface.present(frame);
    }
}

async fn render_loop(
    mut session: watch::Receiver<SessionView>,
    mut status: watch::Receiver<PipelineStatus>,
    lessons: Catalog,
) {
    let mut last = String::new();
    loop {
        let model = ViewModel::project(&session.borrow_and_update(), &lessons, &status.borrow_and_update());
        let text = render_text(&model);
        if text != last {
            println!("{}", text);
            last = text;
        }
        tokio::select! {
            changed = session.changed() => if changed.is_err() { break },
            changed = status.changed() => if changed.is_err() { break },
        }
    }
}

async fn run_practice(options: PracticeOptions, config: &Config) -> anyhow::Result<()> {
    let lessons = load_catalog(config)?;
    let language = options.lang.unwrap_or(config.ui.default_language);

    let mut pipeline_config = config.pipeline.clone();
    if let Some(amount) = options.blur {
        pipeline_config.blur_amount = amount;
        pipeline_config.blur_enabled = amount > 0;
    }

    let surface = SharedSurface::new(pipeline_config.snapshot_quality);
    let validator = GeminiValidator::from_config(&config.validator)?;
    if !validator.is_configured() {
        warn!(
            var = %config.validator.api_key_env,
            "No API key configured; validations will report a missing key"
        );
    }

    let session = ValidationSession::builder(validator, surface.clone())
        .lessons(lessons.clone())
        .storage(SessionStorage::new())
        .config(&config.session)
        .auto_validate(config.session.auto_validate && !options.no_auto)
        .default_language(language)
        .build();
    if let Some(name) = &options.game {
        session.start_game(name)?;
    }

    if let Some(dir) = &options.output {
        std::fs::create_dir_all(dir)?;
    }
    let display = RecordingSurface {
        surface: surface.clone(),
        output_dir: options.output.clone(),
        written: AtomicU64::new(0),
    };

    let pipeline = FramePipeline::start(
        ReplayHandTracker::open(&options.frames, pipeline_config.perception.clone()),
        ReplaySegmenter::open(&options.frames),
        LiveSettings::new(pipeline_config.blur_settings()),
        Duration::from_secs(pipeline_config.first_frame_timeout_secs),
    );
    let handle = pipeline.handle();
    let source = ReplayFeed::open(&options.frames).map(|feed| {
        feed.with_interval(options.frame_interval)
            .with_resolution(pipeline_config.camera_width, pipeline_config.camera_height)
    });

    let renderer = tokio::spawn(render_loop(session.subscribe(), handle.subscribe_status(), lessons));
    let auto_validate = tokio::spawn({
        let session = session.clone();
        async move { session.run_auto_validate().await }
    });
    let mut frames = tokio::spawn(pipeline.run(source, display, session.clone()));

    let outcome = tokio::select! {
        joined = &mut frames => joined,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, tearing down");
            handle.teardown();
            session.shutdown();
            frames.await
        }
    };

    let result = match outcome.context("frame pipeline task failed")? {
        Ok(stats) => {
            if options.no_auto && !session.is_shut_down() {
                if let Err(reason) = session.trigger(TriggerOrigin::Manual).await {
                    warn!(%reason, "Manual validation skipped");
                }
            }
            // Let an in-flight automatic validation land before stopping
            let mut updates = session.subscribe();
            let _ = updates.wait_for(|view| !view.state.is_validation_in_flight).await;

            info!(
                frames = stats.frames_processed,
                with_hands = stats.frames_with_hands,
                "Practice feed finished"
            );
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("camera error")),
    };

    session.shutdown();
    if let Err(e) = auto_validate.await {
        warn!(error = %e, "Auto-validate task failed");
    }
    renderer.abort();

    let state = session.snapshot();
    println!("\nSession {} finished", state.session_id);
    if let Some(debug) = &state.last_debug {
        println!("  Last call: {} at {} ({} ms)", debug.prompt_context, debug.timestamp, debug.latency_ms);
        if let Some(error) = &debug.error {
            println!("  Last error: {}", error);
        }
    }
    if let Some(dir) = &options.output {
        println!("  Frames written to {}", dir.display());
    }
    result
}

fn run_init(force: bool, config_path: &Path, config: &Config) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save(config_path)?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    std::fs::create_dir_all(Cli::output_dir())?;
    println!("\nCreated directories:");
    println!("  Frames: {:?}", Cli::output_dir());

    Ok(())
}

fn run_config(action: ConfigAction, config_path: &Path, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", config_path);
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Get { key } => {
            println!("{} = {}", key, config.get_value(&key)?);
        }
        ConfigAction::Set { key, value } => {
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'signflow init' first.");
            }

            let mut stored = Config::load(config_path)?;
            stored.set_value(&key, &value)?;
            stored.save(config_path)?;
            println!("Set {} = {}", key, stored.get_value(&key)?);
        }
        ConfigAction::Reset { force } => {
            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save(config_path)?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}
