//! Benchmarks for the per-request analysis pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use soil_health_advisor::models::{Activation, DenseLayer};
use soil_health_advisor::{
    Advisor, AnalysisRequest, Calibration, DenseRegressor, DiseaseKnowledgeBase, UnavailableModel,
};
use std::sync::Arc;

fn dense(name: &str, hidden: usize, outputs: usize) -> DenseRegressor {
    let layers = vec![
        DenseLayer {
            weights: (0..hidden).map(|i| vec![0.1 * (i as f64 + 1.0)]).collect(),
            bias: vec![0.05; hidden],
            activation: Activation::Relu,
        },
        DenseLayer {
            weights: (0..outputs).map(|_| vec![1.0 / hidden as f64; hidden]).collect(),
            bias: vec![0.0; outputs],
            activation: Activation::Linear,
        },
    ];
    DenseRegressor::new(name, layers).expect("bench model shape")
}

fn requests(count: usize) -> Vec<AnalysisRequest> {
    (0..count)
        .map(|i| AnalysisRequest::new(4.0 + (i % 60) as f64 * 0.1, 12.0 + (i % 28) as f64))
        .collect()
}

fn bench_fallback_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis_fallback");

    let advisor = Advisor::new(
        Arc::new(UnavailableModel::new("nutrient")),
        Arc::new(UnavailableModel::new("irrigation")),
        Calibration::default(),
        DiseaseKnowledgeBase::builtin(),
    );
    let batch = requests(1000);

    group.throughput(Throughput::Elements(1000));

    group.bench_function("analyze_1000_requests", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| {
            for request in &batch {
                black_box(advisor.analyze(request.clone(), &mut rng));
            }
        })
    });

    group.finish();
}

fn bench_model_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis_dense");

    let advisor = Advisor::new(
        Arc::new(dense("nutrient", 64, 7)),
        Arc::new(dense("irrigation", 32, 2)),
        Calibration::default(),
        DiseaseKnowledgeBase::builtin(),
    );
    let batch = requests(1000);

    group.throughput(Throughput::Elements(1000));

    group.bench_function("analyze_1000_requests", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| {
            for request in &batch {
                black_box(advisor.analyze(request.clone(), &mut rng));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fallback_pipeline, bench_model_pipeline);
criterion_main!(benches);
