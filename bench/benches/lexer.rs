use criterion::{criterion_group, criterion_main, Criterion};
use jlang::{lexer, token::Token};
use std::hint::black_box;

static INPUT: &str = include_str!("../../samples/sample.j");

fn lex_fresh(input: &str) {
    let tokens = lexer::lex(input);
    black_box(tokens.len());
}

fn lex_reused(input: &str, buf: &mut Vec<Token>) {
    buf.clear();
    lexer::lex_into(input, buf);
    black_box(buf.len());
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("fresh", |b| b.iter(|| lex_fresh(black_box(INPUT))));
    let mut buf = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);
    c.bench_function("reused", |b| {
        b.iter(|| lex_reused(black_box(INPUT), &mut buf));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
