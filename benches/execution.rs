//! Execution benchmarks for the WebAssembly interpreter.
//!
//! These benchmarks measure instruction dispatch, call overhead, memory
//! operations, and decoding throughput.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use wasmlet::encoder::ModuleBuilder;
use wasmlet::parser::instruction::{BlockType, Instruction, MemArg};
use wasmlet::parser::{FunctionType, ValueType};
use wasmlet::runtime::Interpreter;
use wasmlet::Module;

use Instruction::*;

const I32: BlockType = BlockType::Value(ValueType::I32);
const EMPTY: BlockType = BlockType::Empty;
const WORD: MemArg = MemArg { align: 2, offset: 0 };

fn sig(params: usize, results: usize) -> FunctionType {
    FunctionType::new(vec![ValueType::I32; params], vec![ValueType::I32; results])
}

/// run(n): count local 1 up to n
fn noop_loop() -> Vec<u8> {
    let mut builder = ModuleBuilder::new();
    builder.function(
        sig(1, 1),
        1,
        &[
            Block { block_type: EMPTY },
            LocalGet { local_idx: 0 },
            I32Eqz,
            BrIf { label_idx: 0 },
            Loop { block_type: EMPTY },
            LocalGet { local_idx: 1 },
            I32Const { value: 1 },
            I32Add,
            LocalTee { local_idx: 1 },
            LocalGet { local_idx: 0 },
            I32LtS,
            BrIf { label_idx: 0 },
            End,
            End,
            LocalGet { local_idx: 1 },
        ],
    );
    builder.encode()
}

/// fib(n) with two accumulators
fn fib_iterative() -> Vec<u8> {
    // locals: 0 n, 1 a, 2 b, 3 t
    let mut builder = ModuleBuilder::new();
    builder.function(
        sig(1, 1),
        3,
        &[
            I32Const { value: 1 },
            LocalSet { local_idx: 2 },
            Block { block_type: EMPTY },
            LocalGet { local_idx: 0 },
            I32Eqz,
            BrIf { label_idx: 0 },
            Loop { block_type: EMPTY },
            LocalGet { local_idx: 1 },
            LocalGet { local_idx: 2 },
            I32Add,
            LocalSet { local_idx: 3 },
            LocalGet { local_idx: 2 },
            LocalSet { local_idx: 1 },
            LocalGet { local_idx: 3 },
            LocalSet { local_idx: 2 },
            LocalGet { local_idx: 0 },
            I32Const { value: 1 },
            I32Sub,
            LocalTee { local_idx: 0 },
            BrIf { label_idx: 0 },
            End,
            End,
            LocalGet { local_idx: 1 },
        ],
    );
    builder.encode()
}

/// fib(n) = n < 2 ? n : fib(n - 1) + fib(n - 2)
fn fib_recursive() -> Vec<u8> {
    let mut builder = ModuleBuilder::new();
    builder.function(
        sig(1, 1),
        0,
        &[
            LocalGet { local_idx: 0 },
            I32Const { value: 2 },
            I32LtS,
            If { block_type: I32 },
            LocalGet { local_idx: 0 },
            Else,
            LocalGet { local_idx: 0 },
            I32Const { value: 1 },
            I32Sub,
            Call { func_idx: 0 },
            LocalGet { local_idx: 0 },
            I32Const { value: 2 },
            I32Sub,
            Call { func_idx: 0 },
            I32Add,
            End,
        ],
    );
    builder.encode()
}

/// fill(n): store i at word i for i < n; sum(n): add the words back up
fn memory_words() -> Vec<u8> {
    let mut builder = ModuleBuilder::new();
    let walk = |body: &[Instruction]| {
        let mut code = vec![
            Block { block_type: EMPTY },
            LocalGet { local_idx: 0 },
            I32Eqz,
            BrIf { label_idx: 0 },
            Loop { block_type: EMPTY },
            LocalGet { local_idx: 0 },
            I32Const { value: 1 },
            I32Sub,
            LocalSet { local_idx: 0 },
        ];
        code.extend_from_slice(body);
        code.extend_from_slice(&[LocalGet { local_idx: 0 }, BrIf { label_idx: 0 }, End, End, LocalGet { local_idx: 1 }]);
        code
    };
    builder.function(
        sig(1, 1),
        1,
        &walk(&[
            LocalGet { local_idx: 0 },
            I32Const { value: 4 },
            I32Mul,
            LocalGet { local_idx: 0 },
            I32Store { memarg: WORD },
        ]),
    );
    builder.function(
        sig(1, 1),
        1,
        &walk(&[
            LocalGet { local_idx: 1 },
            LocalGet { local_idx: 0 },
            I32Const { value: 4 },
            I32Mul,
            I32Load { memarg: WORD },
            I32Add,
            LocalSet { local_idx: 1 },
        ]),
    );
    builder.memory(1, Some(1));
    builder.encode()
}

fn load(bytes: &[u8]) -> Module {
    wasmlet::parse(bytes).expect("benchmark module decodes")
}

fn call(module: &mut Module, function: u32, arg: i32) -> i32 {
    Interpreter::new(module).invoke(function, &[arg]).expect("benchmark function runs")[0]
}

/// Verify module correctness before benchmarking
fn verify_modules() {
    let mut module = load(&noop_loop());
    assert_eq!(call(&mut module, 0, 1000), 1000, "noop_loop(1000) should be 1000");
    assert_eq!(call(&mut module, 0, 0), 0, "noop_loop(0) should be 0");

    let mut iterative = load(&fib_iterative());
    let mut recursive = load(&fib_recursive());
    for (n, expected) in [(0, 0), (1, 1), (10, 55), (20, 6765)] {
        assert_eq!(call(&mut iterative, 0, n), expected, "fib_iterative({n}) should be {expected}");
        assert_eq!(call(&mut recursive, 0, n), expected, "fib_recursive({n}) should be {expected}");
    }
    assert_eq!(call(&mut iterative, 0, 40), 102334155);

    let mut memory = load(&memory_words());
    call(&mut memory, 0, 100);
    assert_eq!(call(&mut memory, 1, 100), 4950, "sum of words 0..100 should be 4950");

    println!("All module correctness checks passed.");
}

fn bench_noop_loop(c: &mut Criterion) {
    let mut module = load(&noop_loop());

    let mut group = c.benchmark_group("dispatch");
    for iterations in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("noop_loop", iterations), &iterations, |b, &n| {
            b.iter(|| black_box(call(&mut module, 0, n)));
        });
    }
    group.finish();
}

fn bench_fib(c: &mut Criterion) {
    let mut iterative = load(&fib_iterative());
    let mut recursive = load(&fib_recursive());

    let mut group = c.benchmark_group("compute");
    for n in [10, 20, 40] {
        group.bench_with_input(BenchmarkId::new("fib_iterative", n), &n, |b, &n| {
            b.iter(|| black_box(call(&mut iterative, 0, n)));
        });
    }
    group.finish();

    let mut group = c.benchmark_group("call_overhead");
    // n=20 makes ~22k calls
    for n in [10, 15, 20] {
        group.bench_with_input(BenchmarkId::new("fib_recursive", n), &n, |b, &n| {
            b.iter(|| black_box(call(&mut recursive, 0, n)));
        });
    }
    group.finish();
}

fn bench_memory(c: &mut Criterion) {
    let mut module = load(&memory_words());

    let mut group = c.benchmark_group("memory");
    for words in [100, 1000, 16384] {
        call(&mut module, 0, words);
        group.bench_with_input(BenchmarkId::new("sum_words", words), &words, |b, &n| {
            b.iter(|| black_box(call(&mut module, 1, n)));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let bytes = memory_words();
    c.bench_function("decode/memory_words", |b| {
        b.iter(|| black_box(wasmlet::parse(black_box(&bytes)).is_ok()))
    });
}

// Run verification before benchmarks
fn verify_and_bench(c: &mut Criterion) {
    verify_modules();
    bench_noop_loop(c);
    bench_fib(c);
    bench_memory(c);
    bench_decode(c);
}

criterion_group!(benches, verify_and_bench);
criterion_main!(benches);
