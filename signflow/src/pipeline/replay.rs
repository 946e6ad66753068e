//! Replayed camera feed
//!
//! Frames are read from a directory in file-name order. Recorded perception
//! outputs may sit next to each frame:
//!
//! - `<stem>.hands.json`: array of hands, each an array of 21 `[x, y, z]`
//! - `<stem>.mask.png`: grayscale segmentation mask, white = subject
//!
//! A frame without sidecars has no hands and is treated as all subject.

use super::frame::{Frame, FrameSource};
use super::landmarks::HandLandmarks;
use super::perception::{HandDetection, HandTracker, PerceptionOptions, SegmentationMask, Segmenter};
use super::PipelineError;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const HANDS_SUFFIX: &str = ".hands.json";
const MASK_SUFFIX: &str = ".mask.png";

fn is_frame_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with(MASK_SUFFIX) {
        return false;
    }
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("png" | "jpg" | "jpeg")
    )
}

fn require_dir(dir: &Path) -> Result<(), PipelineError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(PipelineError::CapabilityUnavailable(format!("{} is not a directory", dir.display())))
    }
}

/// Frame source reading image files from a directory
#[derive(Debug)]
pub struct ReplayFeed {
    frames: Vec<PathBuf>,
    cursor: usize,
    sequence: u64,
    interval: Option<Duration>,
    /// Requested camera resolution; frames of another size are resized
    resolution: Option<(u32, u32)>,
}

impl ReplayFeed {
    /// List the frames in `dir`. An empty directory means there is no camera.
    pub fn open(dir: &Path) -> Result<Self, PipelineError> {
        require_dir(dir)?;
        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_frame_file(p))
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(PipelineError::CameraStart(format!("no frames found in {}", dir.display())));
        }
        debug!(count = frames.len(), dir = %dir.display(), "Opened replay feed");

        Ok(Self {
            frames,
            cursor: 0,
            sequence: 0,
            interval: None,
            resolution: None,
        })
    }

    /// Pace frames like a live camera
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Deliver frames at the given camera resolution. A zero dimension
    /// keeps each file's own size.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width > 0 && height > 0).then_some((width, height));
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplayFeed {
    async fn next_frame(&mut self) -> Option<Frame> {
        if let Some(interval) = self.interval {
            if self.sequence > 0 && self.cursor < self.frames.len() {
                tokio::time::sleep(interval).await;
            }
        }

        while self.cursor < self.frames.len() {
            let path = self.frames[self.cursor].clone();
            self.cursor += 1;

            match image::open(&path) {
                Ok(image) => {
                    let label = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let mut pixels = image.to_rgba8();
                    if let Some((width, height)) = self.resolution {
                        if pixels.dimensions() != (width, height) {
                            pixels = imageops::resize(&pixels, width, height, FilterType::Triangle);
                        }
                    }
                    let frame = Frame::new(pixels, self.sequence).with_label(label);
                    self.sequence += 1;
                    return Some(frame);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable frame");
                }
            }
        }
        None
    }
}

fn sidecar_path(dir: &Path, frame: &Frame, suffix: &str) -> Option<PathBuf> {
    frame.label.as_ref().map(|label| dir.join(format!("{}{}", label, suffix)))
}

/// Hand tracker replaying `<stem>.hands.json` sidecars
#[derive(Debug, Clone)]
pub struct ReplayHandTracker {
    dir: PathBuf,
    options: PerceptionOptions,
}

impl ReplayHandTracker {
    pub fn open(dir: &Path, options: PerceptionOptions) -> Result<Self, PipelineError> {
        require_dir(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            options,
        })
    }
}

impl HandTracker for ReplayHandTracker {
    async fn detect(&mut self, frame: &Frame) -> Result<HandDetection, PipelineError> {
        let Some(path) = sidecar_path(&self.dir, frame, HANDS_SUFFIX).filter(|p| p.exists()) else {
            return Ok(HandDetection::default());
        };
        let content = std::fs::read_to_string(&path)?;
        let raw: Vec<Vec<[f32; 3]>> = serde_json::from_str(&content)
            .map_err(|e| PipelineError::Perception(format!("{}: {}", path.display(), e)))?;

        let hands = raw
            .iter()
            .take(self.options.max_hands)
            .map(|points| HandLandmarks::from_triples(points))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HandDetection { hands })
    }
}

/// Segmenter replaying `<stem>.mask.png` sidecars
#[derive(Debug, Clone)]
pub struct ReplaySegmenter {
    dir: PathBuf,
}

impl ReplaySegmenter {
    pub fn open(dir: &Path) -> Result<Self, PipelineError> {
        require_dir(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }
}

impl Segmenter for ReplaySegmenter {
    async fn segment(&mut self, frame: &Frame) -> Result<SegmentationMask, PipelineError> {
        match sidecar_path(&self.dir, frame, MASK_SUFFIX).filter(|p| p.exists()) {
            Some(path) => Ok(SegmentationMask::new(image::open(&path)?.to_luma8())),
            None => Ok(SegmentationMask::full_foreground(frame.width(), frame.height())),
        }
    }
}
