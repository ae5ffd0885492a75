use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use auditrs::{BiometricReading, ComplianceClassifier, PromptTemplate, Thresholds};

/// Benchmarks for the offline half of a request
///
/// Classification and prompt rendering run on every request before the
/// generation call, so both should stay well under a millisecond.

fn bench_classification(c: &mut Criterion) {
    let classifier = ComplianceClassifier::new(Thresholds::default());

    let mut group = c.benchmark_group("Classification");

    for &size in &[1, 100, 10_000] {
        let readings = create_reading_dataset(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("classify", size), &readings, |b, readings| {
            b.iter(|| {
                for reading in readings {
                    let _ = black_box(classifier.classify(reading));
                }
            });
        });
    }

    group.finish();
}

fn bench_prompt_rendering(c: &mut Criterion) {
    let classifier = ComplianceClassifier::default();
    let mut group = c.benchmark_group("Prompt Rendering");

    let cases = [
        ("optimal", BiometricReading::new(8.0, 52)),
        ("warning", BiometricReading::new(6.0, 80)),
        ("critical", BiometricReading::new(4.5, 92).with_recovery_score(30.0)),
    ];

    for (name, reading) in cases {
        let verdict = classifier
            .classify(&reading)
            .expect("benchmark readings are valid");

        group.bench_with_input(BenchmarkId::new("render", name), &verdict, |b, verdict| {
            b.iter(|| PromptTemplate::render(black_box(verdict), black_box("Tempo run 10k at threshold pace")));
        });
    }

    group.finish();
}

/// Readings spread across every tier
fn create_reading_dataset(size: usize) -> Vec<BiometricReading> {
    (0..size)
        .map(|i| {
            let sleep = 3.0 + (i % 60) as f64 * 0.1;
            let hr = 48 + (i % 45) as i32;
            let reading = BiometricReading::new(sleep, hr);
            if i % 3 == 0 {
                reading.with_recovery_score((i % 100) as f64)
            } else {
                reading
            }
        })
        .collect()
}

criterion_group!(benches, bench_classification, bench_prompt_rendering);
criterion_main!(benches);
