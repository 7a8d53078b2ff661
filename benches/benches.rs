//! Benchmarks for the three phases of an HPKE exchange — sender setup,
//! `Seal`, and `Open` — across the ciphersuites this crate ships.

use criterion::{criterion_group, criterion_main, Criterion};

use hpke_core::{aead::ChaCha20Poly1305, kdf::HkdfSha256, kem::Kem as KemTrait, setup_base_r, setup_base_s};

use rand::{rngs::StdRng, SeedableRng};

fn bench_x25519_chacha(c: &mut Criterion) {
    type A = ChaCha20Poly1305;
    type Kdf = HkdfSha256;
    type Kem = hpke_core::kem::X25519HkdfSha256;

    let mut csprng = StdRng::from_entropy();
    let (sk_recip, pk_recip) = Kem::gen_keypair(&mut csprng);
    let info = b"benchmark info string";

    c.bench_function("setup_base_s (X25519, HKDF-SHA256, ChaCha20Poly1305)", |b| {
        b.iter(|| setup_base_s::<A, Kdf, Kem, _>(&pk_recip, info, &mut csprng).unwrap())
    });

    let (encapped_key, mut sender_ctx) =
        setup_base_s::<A, Kdf, Kem, _>(&pk_recip, info, &mut csprng).unwrap();
    let plaintext = b"a plaintext message of a realistic length for benchmarking purposes";

    c.bench_function("seal (X25519, HKDF-SHA256, ChaCha20Poly1305)", |b| {
        b.iter(|| sender_ctx.seal(plaintext, b"").unwrap())
    });

    let mut receiver_ctx = setup_base_r::<A, Kdf, Kem>(&sk_recip, &encapped_key, info).unwrap();
    let ciphertext = {
        let (_, mut fresh_sender) =
            setup_base_s::<A, Kdf, Kem, _>(&pk_recip, info, &mut csprng).unwrap();
        fresh_sender.seal(plaintext, b"").unwrap()
    };

    c.bench_function("open (X25519, HKDF-SHA256, ChaCha20Poly1305)", |b| {
        b.iter(|| {
            // `open` advances `seq`, so re-derive a fresh receiver per
            // iteration rather than re-opening the same ciphertext twice.
            let mut ctx = setup_base_r::<A, Kdf, Kem>(&sk_recip, &encapped_key, info).unwrap();
            ctx.open(&ciphertext, b"").unwrap()
        })
    });

    let _ = &mut receiver_ctx;
}

#[cfg(feature = "p256")]
fn bench_p256_chacha(c: &mut Criterion) {
    type A = ChaCha20Poly1305;
    type Kdf = HkdfSha256;
    type Kem = hpke_core::kem::DhP256HkdfSha256;

    let mut csprng = StdRng::from_entropy();
    let (_, pk_recip) = Kem::gen_keypair(&mut csprng);
    let info = b"benchmark info string";

    c.bench_function("setup_base_s (P-256, HKDF-SHA256, ChaCha20Poly1305)", |b| {
        b.iter(|| setup_base_s::<A, Kdf, Kem, _>(&pk_recip, info, &mut csprng).unwrap())
    });
}

#[cfg(feature = "p256")]
criterion_group!(benches, bench_x25519_chacha, bench_p256_chacha);
#[cfg(not(feature = "p256"))]
criterion_group!(benches, bench_x25519_chacha);

criterion_main!(benches);
