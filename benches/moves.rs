use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mcmc_nodes::{
    mh_move, mh_move_elementwise, Array, Blanket, LogProb, Model, NodeHandle, Normal, Param, Slide,
};
use rand::{rngs::SmallRng, SeedableRng};

fn make_model(len: usize) -> (Model, NodeHandle<Normal, Array>, NodeHandle<Normal, Array>) {
    let mut model = Model::new();
    let z = model
        .add_array::<Normal>("z", len, [("mean", 0.0.into()), ("sd", 1.0.into())])
        .unwrap();
    let y = model
        .add_array::<Normal>("y", len, [("mean", Param::elementwise(z)), ("sd", 1.0.into())])
        .unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    model.draw_all(&mut rng);
    (model, z, y)
}

fn criterion_benchmark(c: &mut Criterion) {
    for len in [10, 1000] {
        let (mut model, z, y) = make_model(len);
        let kernel = Slide { tuning: 0.5 };

        c.bench_function(&format!("elementwise sweep {len}"), |b| {
            b.iter_batched(
                || SmallRng::seed_from_u64(42),
                |mut rng| {
                    mh_move_elementwise(
                        &mut model,
                        z,
                        &kernel,
                        &mut |m: &Model, i: usize| (z.element(i), y.element(i)).logprob(m),
                        &mut rng,
                    )
                },
                BatchSize::SmallInput,
            )
        });

        let mut blanket = Blanket::new().with(&model, z).with(&model, y);
        c.bench_function(&format!("block move {len}"), |b| {
            b.iter_batched(
                || SmallRng::seed_from_u64(42),
                |mut rng| mh_move(&mut model, z, &kernel, &mut blanket, &mut rng),
                BatchSize::SmallInput,
            )
        });

        c.bench_function(&format!("joint logprob {len}"), |b| {
            b.iter(|| black_box(&model).logprob())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
