use criterion::{criterion_group, criterion_main};


criterion_group!(benches_model, model::bench_model, model::bench_parameters);
criterion_group!(benches_convolution, convolution::bench_convolution);
criterion_main!(benches_model, benches_convolution);
