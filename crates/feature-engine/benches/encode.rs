use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::{FeatureEncoder, FeatureIndexMap, Submission};

fn bench_encode(c: &mut Criterion) {
    let map: FeatureIndexMap = [
        "age",
        "bmi",
        "children",
        "sex_female",
        "sex_male",
        "smoker_no",
        "smoker_yes",
        "region_northeast",
        "region_northwest",
        "region_southeast",
        "region_southwest",
    ]
    .into_iter()
    .collect();
    let encoder = FeatureEncoder::new(map);

    let submission = Submission::new()
        .with("age", "30")
        .with("sex", "male")
        .with("bmi", "25.0")
        .with("children", "0")
        .with("smoker", "no")
        .with("region", "southeast");

    c.bench_function("encode_full_submission", |b| {
        b.iter(|| encoder.encode(black_box(&submission)))
    });

    let sparse = Submission::new().with("sex", "unknown");
    c.bench_function("encode_sparse_submission", |b| {
        b.iter(|| encoder.encode(black_box(&sparse)))
    });
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
