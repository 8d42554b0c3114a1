//! Latency of the envelope primitives.
//!
//! PBKDF2 at 100k iterations dominates both seal and open; the cipher work
//! is noise next to it. Run with: `cargo bench --bench envelope_benchmark`

use criterion::{black_box, criterion_group, criterion_main, Criterion, SamplingMode};
use credvault::{derive_key_with, open, seal, PlaintextCredential, KDF_ITERATIONS};

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(20); // every iteration runs the full KDF

    let credential = PlaintextCredential::new("example.com", "alice", "p@ss").with_notes("");
    let envelope = seal("hunter2", &credential).unwrap();

    group.bench_function("kdf_pbkdf2_sha256_100k", |b| {
        b.iter(|| derive_key_with(black_box("hunter2"), black_box(&[7u8; 32]), KDF_ITERATIONS, 32).unwrap());
    });

    group.bench_function("seal", |b| {
        b.iter(|| seal(black_box("hunter2"), black_box(&credential)).unwrap());
    });

    group.bench_function("open", |b| {
        b.iter(|| open(black_box("hunter2"), black_box(&envelope)).unwrap());
    });

    group.bench_function("open_wrong_password", |b| {
        b.iter(|| open(black_box("wrong"), black_box(&envelope)).is_err());
    });

    group.finish();
}

criterion_group!(benches, bench_envelope);
criterion_main!(benches);
