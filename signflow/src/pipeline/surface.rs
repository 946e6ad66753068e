//! Display surface and snapshot capture

use super::frame::Snapshot;
use super::PipelineError;
use image::RgbaImage;
use parking_lot::RwLock;
use std::sync::Arc;

/// Where composited frames are shown
pub trait DisplaySurface: Send + Sync {
    fn present(&self, frame: RgbaImage);
}

/// Produces the still image sent for validation
pub trait SnapshotSource: Send + Sync {
    fn capture(&self) -> Result<Snapshot, PipelineError>;
}

/// In-memory surface holding the most recent composited frame.
///
/// Cloning shares the same frame, so the pipeline can present into it while
/// the validation session captures snapshots from it.
#[derive(Debug, Clone)]
pub struct SharedSurface {
    latest: Arc<RwLock<Option<RgbaImage>>>,
    /// JPEG quality for snapshots (1-100)
    quality: u8,
}

impl SharedSurface {
    pub fn new(quality: u8) -> Self {
        Self {
            latest: Arc::new(RwLock::new(None)),
            quality,
        }
    }

    /// Copy of the most recently presented frame
    pub fn latest(&self) -> Option<RgbaImage> {
        self.latest.read().clone()
    }

    pub fn clear(&self) {
        *self.latest.write() = None;
    }
}

impl DisplaySurface for SharedSurface {
    fn present(&self, frame: RgbaImage) {
        *self.latest.write() = Some(frame);
    }
}

impl SnapshotSource for SharedSurface {
    fn capture(&self) -> Result<Snapshot, PipelineError> {
        let guard = self.latest.read();
        let frame = guard.as_ref().ok_or(PipelineError::NoFrame)?;
        Snapshot::from_image(frame, self.quality)
    }
}

/// A fixed snapshot, e.g. an image file validated from the command line
impl SnapshotSource for Snapshot {
    fn capture(&self) -> Result<Snapshot, PipelineError> {
        Ok(self.clone())
    }
}
