//! Frames, frame sources and encoded snapshots

use super::PipelineError;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;
use tokio::sync::watch;

/// One camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel data
    pub image: RgbaImage,
    /// Monotonic frame counter assigned by the source
    pub sequence: u64,
    /// Source name (file stem for replayed frames)
    pub label: Option<String>,
}

impl Frame {
    pub fn new(image: RgbaImage, sequence: u64) -> Self {
        Self {
            image,
            sequence,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A source of camera frames.
///
/// Implementations hand out only the most recent frame; frames produced
/// while the pipeline is busy are dropped, not queued.
pub trait FrameSource: Send {
    /// Wait for the next frame, or `None` once the source has ended
    fn next_frame(&mut self) -> impl Future<Output = Option<Frame>> + Send;
}

/// Producer half of a single-slot frame channel
#[derive(Debug)]
pub struct FramePublisher {
    tx: watch::Sender<Option<Frame>>,
}

/// Consumer half of a single-slot frame channel
#[derive(Debug)]
pub struct FrameSlot {
    rx: watch::Receiver<Option<Frame>>,
}

/// Create a latest-frame channel for push-style cameras.
///
/// Publishing overwrites any frame the consumer has not picked up yet.
pub fn frame_slot() -> (FramePublisher, FrameSlot) {
    let (tx, rx) = watch::channel(None);
    (FramePublisher { tx }, FrameSlot { rx })
}

impl FramePublisher {
    /// Replace the pending frame. Returns false once the consumer is gone.
    pub fn publish(&self, frame: Frame) -> bool {
        self.tx.send_replace(Some(frame));
        !self.tx.is_closed()
    }
}

impl FrameSource for FrameSlot {
    async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            if let Some(frame) = self.rx.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }
}

fn data_url_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"^data:image/(png|jpeg|jpg);base64,").unwrap_or_else(|e| panic!("invalid data URL pattern: {}", e))
    })
}

/// A still image encoded for transmission to the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
    mime_type: String,
}

impl Snapshot {
    /// Encode a composited frame as JPEG
    pub fn from_image(image: &RgbaImage, quality: u8) -> Result<Self, PipelineError> {
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&rgb)?;
        Ok(Self {
            bytes,
            mime_type: "image/jpeg".to_string(),
        })
    }

    /// Wrap already-encoded image bytes
    pub fn from_encoded(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Parse a `data:image/...;base64,` URL (or bare base64 JPEG data)
    pub fn from_data_url(data_url: &str) -> Result<Self, PipelineError> {
        let trimmed = data_url.trim();
        let mime_type = match data_url_prefix().captures(trimmed).and_then(|c| c.get(1)) {
            Some(kind) if kind.as_str() == "png" => "image/png",
            _ => "image/jpeg",
        };
        let payload = data_url_prefix().replace(trimmed, "");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| PipelineError::Snapshot(e.to_string()))?;
        if bytes.is_empty() {
            return Err(PipelineError::Snapshot("empty image payload".to_string()));
        }
        Ok(Self::from_encoded(bytes, mime_type))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Standard base64 of the encoded bytes (no data URL prefix)
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_snapshot_from_image_is_jpeg() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 255]));
        let snapshot = Snapshot::from_image(&image, 60).unwrap();
        assert_eq!(snapshot.mime_type(), "image/jpeg");
        assert_eq!(&snapshot.bytes()[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_data_url_prefix_is_stripped() {
        let snapshot = Snapshot::from_data_url("data:image/png;base64,AQID").unwrap();
        assert_eq!(snapshot.bytes(), &[1, 2, 3]);
        assert_eq!(snapshot.mime_type(), "image/png");
        assert_eq!(snapshot.to_base64(), "AQID");
    }

    #[test]
    fn test_bare_base64_defaults_to_jpeg() {
        let snapshot = Snapshot::from_data_url("AQID").unwrap();
        assert_eq!(snapshot.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        assert!(Snapshot::from_data_url("data:image/jpeg;base64,@@@").is_err());
        assert!(Snapshot::from_data_url("data:image/jpeg;base64,").is_err());
    }

    #[tokio::test]
    async fn test_frame_slot_keeps_only_latest() {
        let (publisher, mut slot) = frame_slot();
        for seq in 0..3 {
            publisher.publish(Frame::new(RgbaImage::new(1, 1), seq));
        }
        let frame = slot.next_frame().await.unwrap();
        assert_eq!(frame.sequence, 2);

        drop(publisher);
        assert!(slot.next_frame().await.is_none());
    }
}
