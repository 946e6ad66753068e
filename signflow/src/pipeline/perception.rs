//! Perception service seams
//!
//! The frame pipeline awaits one result per submitted frame. Services that
//! deliver results through a registered callback are wrapped with
//! [`Bridged`], which turns the callback into `await_next_result()`.

use super::frame::Frame;
use super::landmarks::HandLandmarks;
use super::PipelineError;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Options handed to the perception services at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionOptions {
    /// Maximum hands reported per frame
    pub max_hands: usize,
    /// Landmark model complexity (0 = lite, 1 = full)
    pub model_complexity: u8,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    /// Segmentation model (0 = general, 1 = landscape)
    pub segmentation_model: u8,
}

impl Default for PerceptionOptions {
    fn default() -> Self {
        Self {
            max_hands: 2,
            model_complexity: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            segmentation_model: 1,
        }
    }
}

/// Hands found in one frame (zero, one or two)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandDetection {
    pub hands: Vec<HandLandmarks>,
}

impl HandDetection {
    pub fn count(&self) -> usize {
        self.hands.len()
    }
}

/// Per-pixel foreground confidence (255 = subject, 0 = background)
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    confidence: GrayImage,
}

impl SegmentationMask {
    pub fn new(confidence: GrayImage) -> Self {
        Self { confidence }
    }

    /// Mask that keeps the whole frame sharp
    pub fn full_foreground(width: u32, height: u32) -> Self {
        Self::new(GrayImage::from_pixel(width, height, Luma([255])))
    }

    pub fn confidence(&self) -> &GrayImage {
        &self.confidence
    }

    /// The mask scaled to a frame size
    pub fn fitted(&self, width: u32, height: u32) -> Cow<'_, GrayImage> {
        if self.confidence.dimensions() == (width, height) {
            Cow::Borrowed(&self.confidence)
        } else {
            Cow::Owned(imageops::resize(&self.confidence, width, height, FilterType::Triangle))
        }
    }
}

/// Multi-hand landmark detector
pub trait HandTracker: Send {
    fn detect(&mut self, frame: &Frame) -> impl Future<Output = Result<HandDetection, PipelineError>> + Send;

    /// Release the underlying service. Later results are dropped.
    fn close(&mut self) {}
}

/// Person segmentation producing an alpha mask
pub trait Segmenter: Send {
    fn segment(&mut self, frame: &Frame) -> impl Future<Output = Result<SegmentationMask, PipelineError>> + Send;

    fn close(&mut self) {}
}

/// Callback handed to a push-style service
#[derive(Debug)]
pub struct ResultCallback<T> {
    tx: mpsc::UnboundedSender<T>,
    open: Arc<AtomicBool>,
}

impl<T> Clone for ResultCallback<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            open: self.open.clone(),
        }
    }
}

impl<T> ResultCallback<T> {
    /// Deliver one result. Silently dropped once the bridge is closed.
    pub fn deliver(&self, value: T) {
        if self.open.load(Ordering::Acquire) {
            let _ = self.tx.send(value);
        }
    }
}

/// Receiving end of a push callback
#[derive(Debug)]
pub struct CallbackBridge<T> {
    rx: mpsc::UnboundedReceiver<T>,
    open: Arc<AtomicBool>,
}

impl<T> CallbackBridge<T> {
    pub fn new() -> (ResultCallback<T>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));
        (
            ResultCallback { tx, open: open.clone() },
            Self { rx, open },
        )
    }

    /// Wait for the next delivered result. `None` after close.
    pub async fn await_next_result(&mut self) -> Option<T> {
        if !self.open.load(Ordering::Acquire) {
            return None;
        }
        self.rx.recv().await
    }

    pub fn close(&mut self) {
        self.open.store(false, Ordering::Release);
        self.rx.close();
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

/// A perception service with a push/callback interface
pub trait PushBackend: Send {
    type Output: Send + 'static;

    /// Register the result callback (replacing any previous one)
    fn on_results(&mut self, callback: ResultCallback<Self::Output>);

    /// Submit a frame; the result arrives through the callback
    fn send(&mut self, frame: &Frame) -> Result<(), PipelineError>;

    fn close(&mut self);
}

/// Pull-style adapter over a [`PushBackend`]
pub struct Bridged<B: PushBackend> {
    backend: B,
    bridge: CallbackBridge<B::Output>,
}

impl<B: PushBackend> Bridged<B> {
    pub fn new(mut backend: B) -> Self {
        let (callback, bridge) = CallbackBridge::new();
        backend.on_results(callback);
        Self { backend, bridge }
    }

    /// Submit a frame and wait for its result
    pub async fn process(&mut self, frame: &Frame) -> Result<B::Output, PipelineError> {
        if !self.bridge.is_open() {
            return Err(PipelineError::Closed);
        }
        self.backend.send(frame)?;
        self.bridge.await_next_result().await.ok_or(PipelineError::Closed)
    }

    fn shutdown(&mut self) {
        self.bridge.close();
        self.backend.close();
    }
}

impl<B> HandTracker for Bridged<B>
where
    B: PushBackend<Output = HandDetection>,
{
    async fn detect(&mut self, frame: &Frame) -> Result<HandDetection, PipelineError> {
        self.process(frame).await
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl<B> Segmenter for Bridged<B>
where
    B: PushBackend<Output = SegmentationMask>,
{
    async fn segment(&mut self, frame: &Frame) -> Result<SegmentationMask, PipelineError> {
        self.process(frame).await
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    /// Segmenter that answers every frame synchronously through its callback
    struct EchoSegmenter {
        callback: Option<ResultCallback<SegmentationMask>>,
        closed: bool,
    }

    impl PushBackend for EchoSegmenter {
        type Output = SegmentationMask;

        fn on_results(&mut self, callback: ResultCallback<SegmentationMask>) {
            self.callback = Some(callback);
        }

        fn send(&mut self, frame: &Frame) -> Result<(), PipelineError> {
            let callback = self.callback.as_ref().ok_or(PipelineError::Closed)?;
            callback.deliver(SegmentationMask::full_foreground(frame.width(), frame.height()));
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    #[tokio::test]
    async fn test_bridged_backend_answers_in_order() {
        let mut segmenter = Bridged::new(EchoSegmenter { callback: None, closed: false });
        let frame = Frame::new(RgbaImage::new(4, 3), 0);

        let mask = segmenter.segment(&frame).await.unwrap();
        assert_eq!(mask.confidence().dimensions(), (4, 3));
    }

    #[tokio::test]
    async fn test_closed_bridge_drops_results() {
        let mut segmenter = Bridged::new(EchoSegmenter { callback: None, closed: false });
        Segmenter::close(&mut segmenter);
        assert!(segmenter.backend.closed);

        let frame = Frame::new(RgbaImage::new(2, 2), 1);
        assert!(matches!(segmenter.segment(&frame).await, Err(PipelineError::Closed)));
    }

    #[tokio::test]
    async fn test_callback_after_close_is_ignored() {
        let (callback, mut bridge) = CallbackBridge::<u32>::new();
        callback.deliver(1);
        assert_eq!(bridge.await_next_result().await, Some(1));

        bridge.close();
        callback.deliver(2);
        assert_eq!(bridge.await_next_result().await, None);
    }

    #[test]
    fn test_mask_fitted_resizes_only_when_needed() {
        let mask = SegmentationMask::full_foreground(8, 8);
        assert!(matches!(mask.fitted(8, 8), Cow::Borrowed(_)));
        let resized = mask.fitted(16, 4);
        assert_eq!(resized.dimensions(), (16, 4));
        assert_eq!(resized.get_pixel(3, 3)[0], 255);
    }
}
