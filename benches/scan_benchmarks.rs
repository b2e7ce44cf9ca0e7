//! Bitstream scanner benchmarks
//!
//! Measures start code search, keyframe probing and NAL unit iteration
//! over synthetic Annex B streams.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vidpipe::codec::h264::nal::{
    self, NAL_TYPE_IDR, NAL_TYPE_PPS, NAL_TYPE_SEI, NAL_TYPE_SLICE, NAL_TYPE_SPS,
};

/// Buffer of code-free filler with a single start code at the very end,
/// forcing a full-length scan
fn tail_code_buffer(len: usize) -> Vec<u8> {
    let mut data = vec![0xABu8; len];
    let tail = len - 5;
    data[tail..].copy_from_slice(&[0, 0, 0, 1, 0x65]);
    data
}

/// Annex B stream of `units` NAL units with `payload` bytes each, opening
/// with parameter sets, SEI and an IDR slice, non-IDR slices after
fn synthetic_stream(units: usize, payload: usize) -> Vec<u8> {
    let types = [NAL_TYPE_SPS, NAL_TYPE_PPS, NAL_TYPE_SEI, NAL_TYPE_IDR];
    let mut out = Vec::new();
    for i in 0..units {
        let nal_type = if i < types.len() {
            types[i]
        } else {
            NAL_TYPE_SLICE
        };
        out.extend_from_slice(&[0, 0, 0, 1]);
        out.push((3 << 5) | nal_type);
        out.extend(std::iter::repeat(0xAB).take(payload));
    }
    out
}

/// Benchmark raw start code search at various buffer sizes
fn bench_start_code_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("start_code_scan");

    for &size in &[4 * 1024, 64 * 1024, 1024 * 1024] {
        let data = tail_code_buffer(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}KiB", size / 1024)),
            &data,
            |b, data| {
                b.iter(|| black_box(nal::find_start_code(black_box(data))));
            },
        );
    }

    group.finish();
}

/// Benchmark the keyframe probe on a realistic access unit
fn bench_keyframe_probe(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyframe_probe");

    // parameter sets and SEI sit in front of the deciding slice
    let access_unit = synthetic_stream(4, 4096);
    group.throughput(Throughput::Bytes(access_unit.len() as u64));

    group.bench_with_input(
        BenchmarkId::from_parameter("idr_access_unit"),
        &access_unit,
        |b, data| {
            b.iter(|| black_box(nal::is_key_frame(black_box(data))));
        },
    );

    group.finish();
}

/// Benchmark full-stream NAL unit iteration
fn bench_unit_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit_iteration");

    for &units in &[30usize, 300] {
        let data = synthetic_stream(units, 1024);
        group.throughput(Throughput::Elements(units as u64));

        group.bench_with_input(BenchmarkId::from_parameter(units), &data, |b, data| {
            b.iter(|| {
                black_box(nal::count_frames(black_box(data)));
                black_box(nal::count_key_frames(black_box(data)));
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets =
        bench_start_code_scan,
        bench_keyframe_probe,
        bench_unit_iteration,
}

criterion_main!(benches);
