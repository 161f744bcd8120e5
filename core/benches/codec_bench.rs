use criterion::{criterion_group, criterion_main, Criterion};
use elidx_core::CodecKind;

fn bench_codec(c: &mut Criterion) {
    let ids: Vec<u32> = (1..=10_000u32).map(|i| i * 7 + (i % 13)).collect();
    for codec in [CodecKind::Gamma, CodecKind::Delta] {
        let bits = codec.encode_all(&ids).unwrap();
        c.bench_function(&format!("{codec}_encode_10k"), |b| b.iter(|| codec.encode_all(&ids).unwrap()));
        c.bench_function(&format!("{codec}_decode_10k"), |b| b.iter(|| codec.decode_all(&bits).unwrap()));
    }
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
