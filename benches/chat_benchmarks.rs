// ABOUTME: Benchmark suite for the chat wire codec's encode/decode throughput
// ABOUTME: Mirrors the teacher's PDU benchmark shape, retargeted at the string-list frame format

use chatrelay::{Frame, Opcode};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::io::Cursor;
use std::time::Duration;

fn sample_frame(field_count: usize, field_len: usize) -> Frame {
    let fields = (0..field_count)
        .map(|i| "x".repeat(field_len.saturating_sub(4)) + &i.to_string())
        .collect();
    Frame::new(Opcode::MessageChannels, fields)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for field_count in [1usize, 4, 8] {
        let frame = sample_frame(field_count, 32);
        group.bench_with_input(
            BenchmarkId::from_parameter(field_count),
            &frame,
            |b, frame| {
                b.iter(|| black_box(frame.encode().unwrap()));
            },
        );
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for field_count in [1usize, 4, 8] {
        let frame = sample_frame(field_count, 32);
        let bytes = frame.encode().unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(field_count),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let mut cursor = Cursor::new(&bytes[..]);
                    let len = Frame::check(&mut cursor).unwrap();
                    cursor.set_position(0);
                    let decoded = Frame::parse(&mut cursor).unwrap();
                    black_box((len, decoded))
                });
            },
        );
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let frame = sample_frame(4, 32);
    c.bench_function("round_trip_single_field_frame", |b| {
        b.iter(|| {
            let bytes = frame.encode().unwrap();
            black_box(chatrelay::codec::decode(&bytes).unwrap())
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = bench_encode, bench_decode, bench_round_trip
}
criterion_main!(benches);
