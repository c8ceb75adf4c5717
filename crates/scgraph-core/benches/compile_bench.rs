//! Criterion benchmarks for the SynthDef pipeline (`scgraph-core`).
//!
//! Three axes:
//!
//! - **Build** - finalization (controls, sort, dead-code elimination)
//! - **Encode** - SCgf serialization of a finalized graph
//! - **Decode** - SCgf parsing against a static kind table
//!
//! Run with: `cargo bench -p scgraph-core`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use scgraph_core::{
    CalculationRate, InputDecl, Parameter, SynthDef, SynthDefBuilder, UGenKind, UGenOperable,
    decompile_synthdef,
};

const VOICE_COUNTS: &[usize] = &[1, 8, 64];

static SIN_OSC: UGenKind = UGenKind::new("SinOsc")
    .inputs(&[InputDecl::new("frequency", 440.0), InputDecl::new("phase", 0.0)])
    .rates(&[CalculationRate::Audio, CalculationRate::Control])
    .pure();

static OUT: UGenKind = UGenKind::new("Out")
    .inputs(&[InputDecl::new("bus", 0.0), InputDecl::unexpanded("source")])
    .rates(&[CalculationRate::Audio])
    .output();

static KINDS: [&UGenKind; 2] = [&SIN_OSC, &OUT];

// ---------------------------------------------------------------------------
// Graph constructors
// ---------------------------------------------------------------------------

/// Additive patch: `voices` detuned sines, half of them unused, mixed to
/// one output scaled by an `amplitude` parameter.
fn additive(voices: usize) -> SynthDefBuilder {
    let builder = SynthDefBuilder::new();
    let amplitude = builder.add_parameter(Parameter::new("amplitude", 0.1)).unwrap();
    let frequencies: Vec<f32> = (0..voices).map(|v| 110.0 * (v + 1) as f32).collect();
    let frequency = builder
        .add_parameter(Parameter::vector("frequency", frequencies))
        .unwrap();
    {
        let _guard = builder.enter();
        let sines = SIN_OSC.ar().arg("frequency", frequency).build().unwrap();
        let unused = SIN_OSC.kr().arg("frequency", sines.mul(0.5).unwrap()).build().unwrap();
        black_box(unused);
        let mixed: UGenOperable = sines.mix().unwrap().mul(amplitude).unwrap();
        OUT.ar().arg("source", mixed).build().unwrap();
    }
    builder
}

fn compiled(voices: usize) -> SynthDef {
    additive(voices).build(Some("additive"), true).unwrap()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthdef/build");

    for &voices in VOICE_COUNTS {
        let builder = additive(voices);
        group.bench_with_input(BenchmarkId::new("optimized", voices), &voices, |b, _| {
            b.iter(|| black_box(builder.build(Some("additive"), true).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("unoptimized", voices), &voices, |b, _| {
            b.iter(|| black_box(builder.build(Some("additive"), false).unwrap()));
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthdef/encode");

    for &voices in VOICE_COUNTS {
        let synthdef = compiled(voices);
        group.bench_with_input(BenchmarkId::new("compile", voices), &voices, |b, _| {
            b.iter(|| black_box(synthdef.compile().unwrap()));
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthdef/decode");

    for &voices in VOICE_COUNTS {
        let bytes = compiled(voices).compile().unwrap();
        group.bench_with_input(BenchmarkId::new("decompile", voices), &voices, |b, _| {
            b.iter(|| black_box(decompile_synthdef(black_box(&bytes), &KINDS).unwrap()));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_build, bench_encode, bench_decode);
criterion_main!(benches);
