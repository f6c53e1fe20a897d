use criterion::{black_box, criterion_group, criterion_main, Criterion};

use molsig::{parse_smiles, MoleculeSignature, Radius, SignatureOptions};

const ETHANOL: &str = "CCO";
const CAFFEINE: &str = "Cn1cnc2c1c(=O)n(C)c(=O)n2C";
const IBUPROFEN: &str = "CC(C)Cc1ccc(cc1)C(C)C(=O)O";

fn bench_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");
    for (name, smiles) in [("ethanol", ETHANOL), ("caffeine", CAFFEINE), ("ibuprofen", IBUPROFEN)] {
        let mol = parse_smiles(smiles).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(MoleculeSignature::new(black_box(&mol), &SignatureOptions::default()).unwrap()))
        });
    }
    group.finish();
}

fn bench_decompose(c: &mut Criterion) {
    let options = SignatureOptions::default();
    let signature = MoleculeSignature::from_smiles(CAFFEINE, &options).unwrap();

    c.bench_function("post_compute_neighbors/caffeine", |b| {
        b.iter(|| {
            let mut signature = signature.clone();
            signature.post_compute_neighbors(Radius::Hops(2)).unwrap();
            black_box(signature)
        })
    });
}

criterion_group!(benches, bench_signature, bench_decompose);
criterion_main!(benches);
