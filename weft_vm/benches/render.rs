//! Rendering throughput benchmarks.
//!
//! The engine's core claim is compile-once/render-many: a compiled document
//! should render much faster than re-parsing and re-compiling per call.
//! `compiled_document` measures the steady state; `recompile_every_render`
//! measures the naive path for comparison.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use weft_core::SimpleScope;
use weft_vm::Document;

const TEMPLATE: &str = "{set rows to [\"alpha\": 1, \"beta\": 2, \"gamma\": 3]}\
{for key, value in rows:{key}={value};|empty:nothing}\
{set shout(text) to:{text}!}\
{shout(\"done\")}";

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    group.bench_function("compiled_document", |b| {
        let document = Document::with_defaults(TEMPLATE).expect("parse failed");
        b.iter(|| {
            let mut scope = SimpleScope::new();
            black_box(document.render_to_string(&mut scope))
        })
    });

    group.bench_function("recompile_every_render", |b| {
        b.iter(|| {
            let document = Document::with_defaults(black_box(TEMPLATE)).expect("parse failed");
            let mut scope = SimpleScope::new();
            black_box(document.render_to_string(&mut scope))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
