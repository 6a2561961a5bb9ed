//! # Parser Benchmarks
//!
//! Measures parsing throughput: line scanning, operand validation and
//! deferred jump resolution.
//!
//! Run: `cargo bench --bench parse_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use bcpu_core::{parse, parse_source};

/// Source with `blocks` blocks of arithmetic, each jumping to the next
fn generated_source(blocks: usize) -> String {
    let mut source = String::from("# generated\n");
    for b in 0..blocks {
        let id = if b == 0 { "START".to_string() } else { format!("B{}", b) };
        source.push_str(&format!("BLOCK {}\n", id));
        source.push_str("    SET R_A 0x1f\n");
        source.push_str("    SET R_B 0b1011\n");
        source.push_str("    ADD R_A R_B R_C\n");
        source.push_str("    CMP R_A R_B R_C CARRY R_D\n");
        source.push_str("    SETMEMAD 0d64\n");
        source.push_str("    STORE R_D\n");
        if b + 1 < blocks {
            source.push_str(&format!("    JNE R_A R_B B{}\n", b + 1));
        }
        source.push_str("    END\n");
    }
    source
}

/// Benchmark parsing by program size
fn bench_parse_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for blocks in [1usize, 16, 256] {
        let source = generated_source(blocks);
        group.throughput(Throughput::Elements(source.lines().count() as u64));
        group.bench_with_input(BenchmarkId::new("blocks", blocks), &source, |b, source| {
            b.iter(|| black_box(parse_source(source).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark pre-split lines versus whole text
fn bench_parse_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_input");
    let source = generated_source(64);
    let lines: Vec<&str> = source.lines().collect();

    group.bench_function("lines", |b| b.iter(|| black_box(parse(&lines).unwrap())));
    group.bench_function("source", |b| b.iter(|| black_box(parse_source(&source).unwrap())));

    group.finish();
}

/// Benchmark the disassembler listing
fn bench_listing(c: &mut Criterion) {
    let program = parse_source(&generated_source(64)).unwrap();
    c.bench_function("listing_64_blocks", |b| b.iter(|| black_box(program.to_string())));
}

criterion_group!(benches, bench_parse_sizes, bench_parse_lines, bench_listing);
criterion_main!(benches);
