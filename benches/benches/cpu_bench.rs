//! # CPU Benchmarks
//!
//! Measures the execution engine: single steps, bounded runs and the pure
//! state transition.
//!
//! Run: `cargo bench --bench cpu_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bcpu_core::{parse_source, Cpu, CpuConfig, MachineState, Program};

const COUNTER: &str = "\
BLOCK START
    SET R_ONE 0d1
    SET R_LIMIT 0d200
    JMP LOOP
BLOCK LOOP
    ADD R_I R_ONE R_I
    COPY R_I R_J
    SHUP R_J R_ONE R_J
    XOR R_I R_J R_K
    STORE R_K
    ADDMEMAD R_ONE
    JNE R_I R_LIMIT LOOP
    END
";

fn counter() -> Program {
    parse_source(COUNTER).unwrap()
}

/// Benchmark full runs at several register widths
fn bench_run_widths(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_counter");
    let program = counter();

    for width in [8u32, 64, 256] {
        group.bench_with_input(BenchmarkId::new("bit_width", width), &width, |b, &width| {
            b.iter(|| {
                let mut cpu = Cpu::new(CpuConfig::new(width, false)).unwrap();
                cpu.load(program.clone());
                black_box(cpu.run(10_000).unwrap())
            })
        });
    }

    group.finish();
}

/// Benchmark returning trace entries versus recording only
fn bench_step_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_n");
    let program = counter();

    for with_trace in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("with_trace", with_trace),
            &with_trace,
            |b, &with_trace| {
                b.iter(|| {
                    let mut cpu = Cpu::new(CpuConfig::new(8, false)).unwrap();
                    cpu.load(program.clone());
                    black_box(cpu.step_n(500, with_trace).unwrap())
                })
            },
        );
    }

    group.finish();
}

/// Benchmark the pure transition (clones the whole state per step)
fn bench_stepped(c: &mut Criterion) {
    let program = counter();
    let config = CpuConfig::new(8, false);

    c.bench_function("stepped_100", |b| {
        b.iter(|| {
            let mut state = MachineState::new();
            for _ in 0..100 {
                let (next, _) = state.stepped(&program, &config).unwrap();
                state = next;
            }
            black_box(state)
        })
    });
}

criterion_group!(benches, bench_run_widths, bench_step_trace, bench_stepped);
criterion_main!(benches);
