//! 学習と分割のベンチマーク
//!
//! 接辞構造を持つ合成コーパスを使用して、最適化ループと
//! Viterbiデコーダーの速度を計測します。

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use kireme::{AlgorithmMode, Corpus, Segmenter, Trainer, TrainerConfig};

const STEMS: &[&str] = &[
    "open", "order", "try", "load", "play", "work", "start", "turn", "view", "pack",
];
const PREFIXES: &[&str] = &["", "re", "un", "pre"];
const SUFFIXES: &[&str] = &["", "s", "ing", "ed"];

fn synthetic_corpus() -> Corpus {
    let mut pairs = vec![];
    for (i, stem) in STEMS.iter().enumerate() {
        for (j, prefix) in PREFIXES.iter().enumerate() {
            for (k, suffix) in SUFFIXES.iter().enumerate() {
                let word = format!("{prefix}{stem}{suffix}");
                let frequency = 1 + (i + 3 * j + 5 * k) % 7;
                pairs.push((word, frequency));
            }
        }
    }
    Corpus::from_pairs(pairs).unwrap()
}

fn benchmark_training(c: &mut Criterion) {
    let corpus = synthetic_corpus();

    let mut group = c.benchmark_group("Training");
    group.throughput(Throughput::Elements(corpus.len() as u64));
    group.sample_size(10);

    group.bench_function("Baseline", |b| {
        b.iter(|| {
            let config = TrainerConfig::new(AlgorithmMode::Baseline).seed(42);
            Trainer::new(config).train(&corpus).unwrap()
        });
    });

    group.bench_function("BaselineFreqLength", |b| {
        b.iter(|| {
            let config = TrainerConfig::new(AlgorithmMode::BaselineFreqLength).seed(42);
            Trainer::new(config).train(&corpus).unwrap()
        });
    });

    group.finish();
}

fn benchmark_segmentation(c: &mut Criterion) {
    let corpus = synthetic_corpus();
    let config = TrainerConfig::new(AlgorithmMode::BaselineFreqLength).seed(42);
    let tree = Trainer::new(config).train(&corpus).unwrap();
    let segmenter = Segmenter::from_tree(&tree);

    let words: Vec<&str> = corpus.iter().map(|w| w.form()).collect();
    let total_bytes: usize = words.iter().map(|w| w.len()).sum();

    let mut group = c.benchmark_group("Segmentation");
    group.throughput(Throughput::Bytes(total_bytes as u64));

    group.bench_function("Viterbi", |b| {
        b.iter_with_setup(
            || segmenter.new_worker(),
            |mut worker| {
                for word in &words {
                    worker.reset_word(word);
                    worker.segment();
                }
            },
        );
    });

    group.finish();
}

criterion_group!(benches, benchmark_training, benchmark_segmentation);
criterion_main!(benches);
