//! Frame Pipeline
//!
//! Turns each camera frame into a displayed, privacy-preserving, annotated
//! frame: blurred background, sharp subject cut out by the segmentation
//! mask, and the detected hand skeletons drawn on top.
//!
//! Perception (hand landmarks, person segmentation) is delegated to
//! external services behind the [`HandTracker`] and [`Segmenter`] traits.
//! Push-style services are adapted to the pull-style traits through
//! [`perception::CallbackBridge`].

pub mod frame;
pub mod landmarks;
pub mod perception;
pub mod compositor;
pub mod surface;
pub mod replay;
pub mod runner;

pub use compositor::{composite, BlurSettings, LiveSettings};
pub use frame::{frame_slot, Frame, FramePublisher, FrameSlot, FrameSource, Snapshot};
pub use landmarks::{HandLandmarks, Landmark, HAND_CONNECTIONS, HAND_LANDMARK_COUNT};
pub use perception::{HandDetection, HandTracker, PerceptionOptions, SegmentationMask, Segmenter};
pub use replay::{ReplayFeed, ReplayHandTracker, ReplaySegmenter};
pub use runner::{FramePipeline, HandCountSink, PipelineHandle, PipelineStats, PipelineStatus};
pub use surface::{DisplaySurface, SharedSurface, SnapshotSource};

/// Frame pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A perception capability could not be initialized
    #[error("perception capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The camera (frame source) could not be started
    #[error("failed to start camera: {0}")]
    CameraStart(String),

    /// A perception call failed for one frame
    #[error("perception failed: {0}")]
    Perception(String),

    #[error("hand must have {expected} landmarks, got {found}")]
    InvalidLandmarks { expected: usize, found: usize },

    /// No composited frame is available yet
    #[error("no frame available for snapshot")]
    NoFrame,

    /// The capability was closed while a result was awaited
    #[error("perception service closed")]
    Closed,

    #[error("invalid snapshot data: {0}")]
    Snapshot(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
