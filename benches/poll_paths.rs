//! Poll-path microbenchmarks
//!
//! Measures the read planner and the register codec, the pure functions a
//! poll cycle runs over the whole catalog.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use parmair_modbus::batcher::plan_read_spans;
use parmair_modbus::codec::{decode_raw, decode_value};
use parmair_modbus::registers::FirmwareFamily;
use parmair_modbus::MAX_READ_REGISTERS;

/// Span planning over each family's polled address set
fn bench_plan_read_spans(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_read_spans");

    for family in [FirmwareFamily::V1, FirmwareFamily::V2] {
        let addresses: Vec<u16> = family.catalog().polled().map(|d| d.address).collect();
        group.bench_function(format!("{family:?}_catalog"), |b| {
            b.iter(|| plan_read_spans(black_box(&addresses), MAX_READ_REGISTERS as u16));
        });
    }

    // Worst case for the planner: nothing merges
    let scattered: Vec<u16> = (0u16..250).map(|i| 1000 + i * 2).collect();
    group.bench_function("scattered_250", |b| {
        b.iter(|| plan_read_spans(black_box(&scattered), MAX_READ_REGISTERS as u16));
    });

    group.finish();
}

/// Decoding a full catalog's worth of raw words
fn bench_decode(c: &mut Criterion) {
    let definitions: Vec<_> = FirmwareFamily::V1.catalog().definitions().collect();

    c.bench_function("decode_catalog", |b| {
        b.iter(|| {
            for (i, definition) in definitions.iter().enumerate() {
                black_box(decode_value(definition, black_box(i as u16 * 97)));
            }
        });
    });

    c.bench_function("decode_raw_sweep", |b| {
        b.iter(|| {
            for raw in 0..=u16::MAX {
                black_box(decode_raw(black_box(raw)));
            }
        });
    });
}

criterion_group!(benches, bench_plan_read_spans, bench_decode);
criterion_main!(benches);
