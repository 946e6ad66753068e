//! Criterion benchmarks for the per-frame hot path
//!
//! Covers: background blur compositing at several radii, skeleton overlay,
//! snapshot JPEG encoding, and model reply parsing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use signflow::pipeline::{composite, BlurSettings, HandLandmarks, SegmentationMask, Snapshot};
use signflow::validator::parse_reply;

fn make_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]))
}

/// Subject in the middle third, background elsewhere
fn make_mask(width: u32, height: u32) -> SegmentationMask {
    SegmentationMask::new(GrayImage::from_fn(width, height, |x, _| {
        if x > width / 3 && x < 2 * width / 3 {
            Luma([255])
        } else {
            Luma([0])
        }
    }))
}

fn make_hand() -> HandLandmarks {
    let triples: Vec<[f32; 3]> = (0..21)
        .map(|i| [0.3 + (i % 5) as f32 * 0.05, 0.3 + (i / 5) as f32 * 0.08, 0.0])
        .collect();
    HandLandmarks::from_triples(&triples).unwrap()
}

// ---------------------------------------------------------------------------
// Compositing benchmarks
// ---------------------------------------------------------------------------

fn bench_composite_blur(c: &mut Criterion) {
    let frame = make_frame(320, 240);
    let mask = make_mask(320, 240);
    let mut group = c.benchmark_group("composite_blur");

    for amount in [0u32, 5, 15, 30] {
        let blur = BlurSettings { enabled: true, amount };
        group.bench_with_input(BenchmarkId::from_parameter(amount), &blur, |b, blur| {
            b.iter(|| composite(black_box(&frame), Some(&mask), &[], *blur));
        });
    }
    group.finish();
}

fn bench_composite_overlay(c: &mut Criterion) {
    let frame = make_frame(640, 480);
    let hands = vec![make_hand(), make_hand()];
    let blur = BlurSettings { enabled: false, amount: 0 };

    c.bench_function("composite_two_hand_overlay", |b| {
        b.iter(|| composite(black_box(&frame), None, black_box(&hands), blur));
    });
}

// ---------------------------------------------------------------------------
// Validation path benchmarks
// ---------------------------------------------------------------------------

fn bench_snapshot_encode(c: &mut Criterion) {
    let frame = make_frame(640, 480);

    c.bench_function("snapshot_jpeg_q60", |b| {
        b.iter(|| Snapshot::from_image(black_box(&frame), 60).unwrap());
    });
}

fn bench_parse_reply(c: &mut Criterion) {
    let reply = r#"Here you go: {"isValid": true, "confidence": "0.87", "feedback": "Thumb placement looks right", "suggestions": ["Keep the wrist straight", "Hold for a second"]} done"#;

    c.bench_function("parse_reply_wrapped", |b| {
        b.iter(|| parse_reply(black_box(reply)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_composite_blur,
    bench_composite_overlay,
    bench_snapshot_encode,
    bench_parse_reply
);
criterion_main!(benches);
