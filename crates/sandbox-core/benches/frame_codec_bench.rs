//! Criterion benchmarks for the frame codec and request decoding.
//!
//! A full-HD greyscale frame is about 2 MB, and one is published every
//! simulation iteration, so frame encoding must stay well below a millisecond.
//!
//! Run with:
//! ```bash
//! cargo bench --package sandbox-core --bench frame_codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sandbox_core::{decode_frame, decode_request, encode_frame, Frame};

fn make_frame(width: u32, height: u32) -> Frame {
    let pixels = (0..width as usize * height as usize)
        .map(|i| (i % 251) as u8)
        .collect();
    Frame::from_pixels(width, height, pixels).expect("valid frame")
}

fn bench_frame_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_codec");
    for &(w, h) in &[(640u32, 480u32), (1280, 720), (1920, 1080)] {
        let frame = make_frame(w, h);
        let encoded = encode_frame(&frame, 0, 0).expect("encode");

        group.bench_with_input(BenchmarkId::new("encode", format!("{w}x{h}")), &frame, |b, f| {
            b.iter(|| encode_frame(black_box(f), 1, 2).expect("encode"))
        });
        group.bench_with_input(
            BenchmarkId::new("decode", format!("{w}x{h}")),
            &encoded,
            |b, bytes| b.iter(|| decode_frame(black_box(bytes)).expect("decode")),
        );
    }
    group.finish();
}

fn bench_decode_request(c: &mut Criterion) {
    let line = r#"{"state":"init","kind":"kinect","payload":{"serial":"K1","fps":30}}"#;
    c.bench_function("decode_request/register", |b| {
        b.iter(|| decode_request(black_box(line)).expect("decode"))
    });
}

criterion_group!(benches, bench_frame_codec, bench_decode_request);
criterion_main!(benches);
