//! Primitive codec benchmarks for stdfkit
//!
//! These benchmarks measure the per-field cost of the byte-level codec,
//! which every record conversion pays once per schema field.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box as hint_black_box;

use stdfkit::codec::{BitArray, ByteReader, ByteWriter, Endianness};

fn bench_scalar_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_write");

    for endian in [Endianness::Little, Endianness::Big] {
        group.bench_with_input(
            BenchmarkId::new("u32", format!("{endian:?}")),
            &endian,
            |b, &endian| {
                b.iter(|| {
                    let mut w = ByteWriter::with_capacity(endian, 16);
                    w.write_u32(black_box(0xDEAD_BEEF));
                    w.write_u32(black_box(1_700_000_000));
                    hint_black_box(w.into_bytes())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("f32", format!("{endian:?}")),
            &endian,
            |b, &endian| {
                b.iter(|| {
                    let mut w = ByteWriter::with_capacity(endian, 16);
                    w.write_f32(black_box(1.000_25));
                    w.write_f32(black_box(-273.15));
                    hint_black_box(w.into_bytes())
                });
            },
        );
    }

    group.finish();
}

fn bench_scalar_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_read");

    for endian in [Endianness::Little, Endianness::Big] {
        let mut w = ByteWriter::new(endian);
        w.write_u16(0x0102);
        w.write_u32(0xDEAD_BEEF);
        w.write_f32(1.000_25);
        w.write_f64(-273.15);
        let body = w.into_bytes();

        group.bench_with_input(
            BenchmarkId::new("mixed", format!("{endian:?}")),
            &body,
            |b, body| {
                b.iter(|| {
                    let mut r = ByteReader::new(black_box(body), endian);
                    let a = r.read_u16().unwrap();
                    let bb = r.read_u32().unwrap();
                    let cc = r.read_f32().unwrap();
                    let d = r.read_f64().unwrap();
                    hint_black_box((a, bb, cc, d))
                });
            },
        );
    }

    group.finish();
}

fn bench_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("strings");

    let samples: Vec<(&str, &str)> = vec![
        ("", "empty"),
        ("W-01", "short"),
        ("PROBE-CARD-REV-7/LOT-2024-0042/RETEST", "typical"),
    ];

    for (text, name) in samples {
        group.bench_with_input(BenchmarkId::new("cn_write", name), &text, |b, &text| {
            b.iter(|| {
                let mut w = ByteWriter::with_capacity(Endianness::Little, 64);
                w.write_cn(black_box(text)).unwrap();
                hint_black_box(w.into_bytes())
            });
        });

        let mut w = ByteWriter::new(Endianness::Little);
        w.write_cn(text).unwrap();
        let body = w.into_bytes();

        group.bench_with_input(BenchmarkId::new("cn_read", name), &body, |b, body| {
            b.iter(|| {
                let mut r = ByteReader::new(black_box(body), Endianness::Little);
                hint_black_box(r.read_cn().unwrap())
            });
        });
    }

    group.finish();
}

fn bench_arrays(c: &mut Criterion) {
    let mut group = c.benchmark_group("arrays");

    for count in [4usize, 64, 512] {
        let values: Vec<u16> = (0..count as u16).collect();

        group.bench_with_input(
            BenchmarkId::new("u16_write", count),
            &values,
            |b, values| {
                b.iter(|| {
                    let mut w = ByteWriter::with_capacity(Endianness::Little, values.len() * 2);
                    w.write_u16_array(black_box(values));
                    hint_black_box(w.into_bytes())
                });
            },
        );

        let mut w = ByteWriter::new(Endianness::Little);
        w.write_u16_array(&values);
        let body = w.into_bytes();

        group.bench_with_input(BenchmarkId::new("u16_read", count), &body, |b, body| {
            b.iter(|| {
                let mut r = ByteReader::new(black_box(body), Endianness::Little);
                hint_black_box(r.read_u16_array(count, false).unwrap())
            });
        });

        let nibbles: Vec<u8> = (0..count).map(|i| (i % 16) as u8).collect();

        group.bench_with_input(
            BenchmarkId::new("nibble_write", count),
            &nibbles,
            |b, nibbles| {
                b.iter(|| {
                    let mut w = ByteWriter::with_capacity(Endianness::Little, nibbles.len());
                    w.write_nibble_array(black_box(nibbles)).unwrap();
                    hint_black_box(w.into_bytes())
                });
            },
        );
    }

    group.finish();
}

fn bench_bit_arrays(c: &mut Criterion) {
    let mut group = c.benchmark_group("bit_arrays");

    for bits in [8usize, 256, 4096] {
        let pattern: Vec<bool> = (0..bits).map(|i| i % 3 == 0).collect();
        let array = BitArray::from_bits(&pattern).unwrap();

        group.bench_with_input(BenchmarkId::new("dn_write", bits), &array, |b, array| {
            b.iter(|| {
                let mut w = ByteWriter::with_capacity(Endianness::Little, bits / 8 + 2);
                w.write_dn(black_box(array));
                hint_black_box(w.into_bytes())
            });
        });

        let mut w = ByteWriter::new(Endianness::Little);
        w.write_dn(&array);
        let body = w.into_bytes();

        group.bench_with_input(BenchmarkId::new("dn_read", bits), &body, |b, body| {
            b.iter(|| {
                let mut r = ByteReader::new(black_box(body), Endianness::Little);
                hint_black_box(r.read_dn().unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_scalar_write,
    bench_scalar_read,
    bench_strings,
    bench_arrays,
    bench_bit_arrays
);
criterion_main!(benches);
