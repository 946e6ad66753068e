//! Frame loop
//!
//! Drives frames from a [`FrameSource`] through segmentation, hand tracking
//! and compositing, and reports status through a watch channel.

use super::compositor::{composite, LiveSettings};
use super::frame::FrameSource;
use super::perception::{HandDetection, HandTracker, Segmenter};
use super::surface::DisplaySurface;
use super::PipelineError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default time allowed for the first frame before warning
pub const DEFAULT_FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(15);

/// Pipeline lifecycle as seen by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Started, no frame processed yet
    Initializing,
    Running,
    /// No frame within the first-frame timeout; still waiting
    InitTimeout,
    /// Terminal; the pipeline never retries
    CameraError(String),
    Stopped,
}

impl PipelineStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::CameraError(_) | PipelineStatus::Stopped)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStatus::Initializing => write!(f, "initializing"),
            PipelineStatus::Running => write!(f, "running"),
            PipelineStatus::InitTimeout => write!(f, "waiting for camera"),
            PipelineStatus::CameraError(msg) => write!(f, "camera error: {}", msg),
            PipelineStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// Receives the number of hands detected in each processed frame
pub trait HandCountSink: Send + Sync {
    fn publish_hand_count(&self, count: usize);
}

impl<T: HandCountSink> HandCountSink for Arc<T> {
    fn publish_hand_count(&self, count: usize) {
        (**self).publish_hand_count(count)
    }
}

/// Counters returned when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub frames_with_hands: u64,
    /// Frames whose perception results arrived after teardown
    pub discarded_after_teardown: u64,
}

/// Control handle for a running pipeline
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    destroyed: Arc<watch::Sender<bool>>,
    status: watch::Receiver<PipelineStatus>,
}

impl PipelineHandle {
    /// Stop the loop. Results of any in-flight perception call are discarded.
    pub fn teardown(&self) {
        self.destroyed.send_replace(true);
    }

    pub fn is_destroyed(&self) -> bool {
        *self.destroyed.borrow()
    }

    pub fn status(&self) -> PipelineStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PipelineStatus> {
        self.status.clone()
    }
}

/// Frame pipeline over a hand tracker `T` and segmenter `G`
pub struct FramePipeline<T, G> {
    capabilities: Result<(T, G), PipelineError>,
    settings: LiveSettings,
    first_frame_timeout: Duration,
    status: watch::Sender<PipelineStatus>,
    destroyed: Arc<watch::Sender<bool>>,
}

impl<T, G> FramePipeline<T, G>
where
    T: HandTracker,
    G: Segmenter,
{
    /// Start the pipeline from already-initialized capabilities.
    ///
    /// If either failed to initialize the pipeline enters `CameraError`
    /// immediately and [`run`](Self::run) returns that error.
    pub fn start(
        tracker: Result<T, PipelineError>,
        segmenter: Result<G, PipelineError>,
        settings: LiveSettings,
        first_frame_timeout: Duration,
    ) -> Self {
        let capabilities = match (tracker, segmenter) {
            (Ok(t), Ok(g)) => Ok((t, g)),
            (Err(e), _) | (_, Err(e)) => Err(e),
        };
        let initial = match &capabilities {
            Ok(_) => PipelineStatus::Initializing,
            Err(e) => {
                warn!(error = %e, "Perception capability failed to initialize");
                PipelineStatus::CameraError(e.to_string())
            }
        };
        let (status, _) = watch::channel(initial);
        let (destroyed, _) = watch::channel(false);

        Self {
            capabilities,
            settings,
            first_frame_timeout,
            status,
            destroyed: Arc::new(destroyed),
        }
    }

    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            destroyed: self.destroyed.clone(),
            status: self.status.subscribe(),
        }
    }

    pub fn status(&self) -> PipelineStatus {
        self.status.borrow().clone()
    }

    fn is_destroyed(&self) -> bool {
        *self.destroyed.borrow()
    }

    fn fail(&self, error: PipelineError) -> PipelineError {
        warn!(error = %error, "Frame pipeline failed");
        self.status.send_replace(PipelineStatus::CameraError(error.to_string()));
        error
    }

    /// Run the frame loop until the source ends or the pipeline is torn down
    pub async fn run<S, D, H>(
        mut self,
        source: Result<S, PipelineError>,
        display: D,
        hands: H,
    ) -> Result<PipelineStats, PipelineError>
    where
        S: FrameSource,
        D: DisplaySurface,
        H: HandCountSink,
    {
        let (mut tracker, mut segmenter) =
            match std::mem::replace(&mut self.capabilities, Err(PipelineError::Closed)) {
                Ok(caps) => caps,
                Err(e) => return Err(e),
            };
        let mut source = match source {
            Ok(source) => source,
            Err(e) => {
                tracker.close();
                segmenter.close();
                return Err(self.fail(e));
            }
        };

        info!(timeout_secs = self.first_frame_timeout.as_secs(), "Frame pipeline started");

        let mut stats = PipelineStats::default();
        let mut destroyed = self.destroyed.subscribe();
        let watchdog = tokio::time::sleep(self.first_frame_timeout);
        tokio::pin!(watchdog);
        let mut awaiting_first_frame = true;

        let outcome = loop {
            if self.is_destroyed() {
                break Ok(());
            }

            let frame = tokio::select! {
                biased;
                _ = destroyed.changed() => continue,
                _ = &mut watchdog, if awaiting_first_frame => {
                    awaiting_first_frame = false;
                    warn!("No camera frame within first-frame timeout");
                    self.status.send_replace(PipelineStatus::InitTimeout);
                    continue;
                }
                next = source.next_frame() => match next {
                    Some(frame) => frame,
                    None => break Ok(()),
                },
            };

            let mask = match segmenter.segment(&frame).await {
                Ok(mask) => Some(mask),
                Err(PipelineError::Closed) => break Err(PipelineError::Closed),
                Err(e) => {
                    warn!(sequence = frame.sequence, error = %e, "Segmentation failed");
                    None
                }
            };
            if self.is_destroyed() {
                stats.discarded_after_teardown += 1;
                break Ok(());
            }

            let detection = match tracker.detect(&frame).await {
                Ok(detection) => detection,
                Err(PipelineError::Closed) => break Err(PipelineError::Closed),
                Err(e) => {
                    warn!(sequence = frame.sequence, error = %e, "Hand tracking failed");
                    HandDetection::default()
                }
            };
            if self.is_destroyed() {
                stats.discarded_after_teardown += 1;
                break Ok(());
            }

            let output = composite(&frame.image, mask.as_ref(), &detection.hands, self.settings.blur());
            hands.publish_hand_count(detection.count());
            display.present(output);

            stats.frames_processed += 1;
            if detection.count() > 0 {
                stats.frames_with_hands += 1;
            }
            if stats.frames_processed == 1 {
                awaiting_first_frame = false;
                self.status.send_replace(PipelineStatus::Running);
                debug!(sequence = frame.sequence, "First frame processed");
            }
        };

        tracker.close();
        segmenter.close();

        match outcome {
            Ok(()) => {
                self.status.send_replace(PipelineStatus::Stopped);
                info!(
                    frames = stats.frames_processed,
                    with_hands = stats.frames_with_hands,
                    "Frame pipeline stopped"
                );
                Ok(stats)
            }
            Err(e) => Err(self.fail(e)),
        }
    }
}
