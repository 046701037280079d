//! Transform cost on a 440 Hz tone

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pitch_analyser::spectrum::band::FrequencyRange;
use pitch_analyser::spectrum::{
    sample_timestamps, LibraryTransform, NaiveTransform, RecursiveTransform, Transform,
};

const SAMPLE_RATE: f64 = 44100.0;
const WINDOW: usize = 4096;

fn tone() -> Vec<f64> {
    (0..WINDOW)
        .map(|i| (i as f64 * 440.0 * 2.0 * std::f64::consts::PI / SAMPLE_RATE).sin() * 0.5)
        .collect()
}

fn bench_transforms(c: &mut Criterion) {
    let samples = tone();
    let timestamps = sample_timestamps(WINDOW, SAMPLE_RATE);
    let range = FrequencyRange::new(100.0, 2000.0).unwrap();

    let mut library = LibraryTransform::new(WINDOW, SAMPLE_RATE);
    c.bench_function("library_4096", |b| {
        b.iter(|| library.compute(black_box(&samples), black_box(&timestamps)))
    });

    let mut recursive = RecursiveTransform::new(WINDOW, SAMPLE_RATE, range);
    c.bench_function("recursive_4096", |b| {
        b.iter(|| recursive.compute(black_box(&samples), black_box(&timestamps)))
    });

    // Narrow band keeps the 0.5 Hz sweep affordable
    let mut naive = NaiveTransform::new(FrequencyRange::new(400.0, 480.0).unwrap(), 0.05);
    c.bench_function("naive_4096_80hz", |b| {
        b.iter(|| naive.compute(black_box(&samples), black_box(&timestamps)))
    });
}

criterion_group!(benches, bench_transforms);
criterion_main!(benches);
