use criterion::{criterion_group, criterion_main, Criterion};
use lalrgen::{
    derives::derives,
    grammar::{examples, Grammar},
    lr0::lr0,
    Config,
};

criterion_main!(benches);
criterion_group!(benches, bench_examples);

fn bench_examples(c: &mut Criterion) {
    for (name, example) in examples::ALL {
        bench_table_gen(c, name, *example);
    }
}

fn bench_table_gen(c: &mut Criterion, grammar_name: &str, example: examples::Example) {
    let grammar = Grammar::define(example).unwrap();

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("LR0", |b| {
        b.iter(|| lr0(&grammar, &derives(&grammar)));
    });
    group.bench_function("LALR", |b| {
        b.iter(|| Config::new().generate(&grammar));
    });
    group.finish();
}
