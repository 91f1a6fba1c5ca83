use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use vmtrans::driver::Driver;

fn synthetic_unit(repetitions: usize) -> String {
    let block = "\
        push constant 17\n\
        push local 3\n\
        eq\n\
        if-goto equal\n\
        push argument 2\n\
        push that 5\n\
        add\n\
        pop static 1\n\
        label equal\n\
        call Math.multiply 2\n\
        return\n";
    block.repeat(repetitions)
}

fn criterion_benchmark(c: &mut Criterion) {
    let input = synthetic_unit(256);
    let mut out = Vec::with_capacity(1 << 20);

    c.bench_function("translate", |b| {
        b.iter(|| {
            out.clear();
            let mut driver = Driver::new(&mut out);
            driver.bootstrap().unwrap();
            driver
                .translate_unit("Synthetic", black_box(input.as_bytes()))
                .unwrap();
            let (_, diagnostics) = driver.finish();
            assert!(diagnostics.is_empty());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
