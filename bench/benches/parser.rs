use criterion::{criterion_group, criterion_main, Criterion};
use jlang::{codegen, diag::Diagnostic, lexer, parser};
use std::hint::black_box;

static INPUT: &str = include_str!("../../samples/sample.j");

fn criterion_benchmark(c: &mut Criterion) {
    let tokens = lexer::lex(INPUT);
    c.bench_function("parse", |b| {
        b.iter(|| parser::parse(black_box(&tokens)).is_ok());
    });

    let program = parser::parse(&tokens).expect("sample must parse");
    c.bench_function("codegen", |b| {
        b.iter(|| {
            let mut sink: Vec<Diagnostic> = Vec::new();
            codegen::generate(black_box(&program), &mut sink).is_ok()
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
