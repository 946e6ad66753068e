//! Frame Compositing
//!
//! Blurred background, sharp subject through the segmentation mask, hand
//! skeleton overlay. Blur settings are read live on every frame so changes
//! apply to the next frame without restarting the pipeline.

use super::landmarks::HandLandmarks;
use super::perception::SegmentationMask;
use image::{imageops, ImageBuffer, Rgba, RgbaImage};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default blur radius in pixels
pub const DEFAULT_BLUR_AMOUNT: u32 = 15;
/// Largest blur radius the slider allows
pub const MAX_BLUR_AMOUNT: u32 = 30;

const CONNECTION_COLOR: Rgba<u8> = Rgba([0x10, 0xb9, 0x81, 0xff]);
const CONNECTION_WIDTH: i32 = 2;
const JOINT_COLOR: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
const JOINT_RADIUS: i32 = 3;

/// Background blur configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlurSettings {
    pub enabled: bool,
    /// Blur radius in pixels; 0 disables blurring
    pub amount: u32,
}

impl BlurSettings {
    /// Whether the next frame is blurred at all
    pub fn is_active(&self) -> bool {
        self.enabled && self.amount > 0
    }
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            amount: DEFAULT_BLUR_AMOUNT,
        }
    }
}

/// Live-adjustable pipeline settings shared with the UI
#[derive(Debug, Clone, Default)]
pub struct LiveSettings {
    blur: Arc<RwLock<BlurSettings>>,
}

impl LiveSettings {
    pub fn new(blur: BlurSettings) -> Self {
        Self {
            blur: Arc::new(RwLock::new(blur)),
        }
    }

    pub fn blur(&self) -> BlurSettings {
        *self.blur.read()
    }

    pub fn set_blur_enabled(&self, enabled: bool) {
        self.blur.write().enabled = enabled;
    }

    /// Set the blur radius, clamped to [`MAX_BLUR_AMOUNT`]
    pub fn set_blur_amount(&self, amount: u32) {
        self.blur.write().amount = amount.min(MAX_BLUR_AMOUNT);
    }
}

/// Composite one output frame.
///
/// Without a mask, or with blur inactive, the raw frame is used unchanged
/// underneath the skeleton overlay.
pub fn composite(
    frame: &RgbaImage,
    mask: Option<&SegmentationMask>,
    hands: &[HandLandmarks],
    blur: BlurSettings,
) -> RgbaImage {
    let mut output = match mask {
        Some(mask) if blur.is_active() => {
            let background = imageops::blur(frame, blur.amount as f32);
            cut_out_subject(frame, &background, mask)
        }
        _ => frame.clone(),
    };

    for hand in hands {
        draw_hand(&mut output, hand);
    }
    output
}

/// Sharp pixels where the mask says "subject", blurred pixels elsewhere
fn cut_out_subject(sharp: &RgbaImage, background: &RgbaImage, mask: &SegmentationMask) -> RgbaImage {
    let (width, height) = sharp.dimensions();
    let mask = mask.fitted(width, height);

    ImageBuffer::from_fn(width, height, |x, y| {
        let alpha = mask.get_pixel(x, y)[0] as u32;
        let fg = sharp.get_pixel(x, y);
        let bg = background.get_pixel(x, y);
        Rgba([
            mix(fg[0], bg[0], alpha),
            mix(fg[1], bg[1], alpha),
            mix(fg[2], bg[2], alpha),
            mix(fg[3], bg[3], alpha),
        ])
    })
}

fn mix(fg: u8, bg: u8, alpha: u32) -> u8 {
    ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8
}

fn draw_hand(image: &mut RgbaImage, hand: &HandLandmarks) {
    let (width, height) = image.dimensions();
    for (a, b) in hand.segments() {
        if let Some((from, to)) = clip_segment(a.to_pixel(width, height), b.to_pixel(width, height), width, height) {
            draw_line(image, from, to, CONNECTION_WIDTH, CONNECTION_COLOR);
        }
    }
    for point in hand.points() {
        if let Some((x, y)) = joint_center(point.to_pixel(width, height), width, height) {
            fill_circle(image, x, y, JOINT_RADIUS, JOINT_COLOR);
        }
    }
}

/// Largest overhang of the pen or a joint beyond the image edge
const CLIP_MARGIN: f64 = (JOINT_RADIUS + CONNECTION_WIDTH) as f64;

/// Clip a segment to the image plus [`CLIP_MARGIN`] (Liang-Barsky).
///
/// Returns `None` for segments that miss the image or have non-finite
/// endpoints. The returned endpoints are bounded, so rasterizing them takes
/// at most one step per pixel of the image's width plus height.
fn clip_segment(from: (f32, f32), to: (f32, f32), width: u32, height: u32) -> Option<((i32, i32), (i32, i32))> {
    let (x0, y0) = (from.0 as f64, from.1 as f64);
    let (x1, y1) = (to.0 as f64, to.1 as f64);
    if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
        return None;
    }

    let (min, max_x, max_y) = (-CLIP_MARGIN, width as f64 - 1.0 + CLIP_MARGIN, height as f64 - 1.0 + CLIP_MARGIN);
    let (dx, dy) = (x1 - x0, y1 - y0);
    let (mut enter, mut exit) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0 - min), (dx, max_x - x0), (-dy, y0 - min), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            if t > exit {
                return None;
            }
            enter = enter.max(t);
        } else {
            if t < enter {
                return None;
            }
            exit = exit.min(t);
        }
    }

    let at = |t: f64| {
        (
            (x0 + t * dx).round().clamp(min, max_x) as i32,
            (y0 + t * dy).round().clamp(min, max_y) as i32,
        )
    };
    Some((at(enter), at(exit)))
}

/// Rounded joint position, or `None` when no part of the joint is visible
fn joint_center(center: (f32, f32), width: u32, height: u32) -> Option<(i32, i32)> {
    let (x, y) = (center.0 as f64, center.1 as f64);
    let reach = JOINT_RADIUS as f64;
    let visible = x.is_finite()
        && y.is_finite()
        && (-reach..=width as f64 - 1.0 + reach).contains(&x)
        && (-reach..=height as f64 - 1.0 + reach).contains(&y);
    visible.then(|| (x.round() as i32, y.round() as i32))
}

fn put_clipped(image: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_circle(image: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: Rgba<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_clipped(image, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham line stamped with a square pen of `width` pixels
fn draw_line(image: &mut RgbaImage, from: (i32, i32), to: (i32, i32), width: i32, color: Rgba<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let lo = -(width - 1) / 2;
    let hi = width / 2;

    loop {
        for oy in lo..=hi {
            for ox in lo..=hi {
                put_clipped(image, x + ox, y + oy, color);
            }
        }
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
