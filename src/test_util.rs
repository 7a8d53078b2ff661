//! Test-only helpers shared across the `kex`, `setup`, and `context` test
//! modules: generating keypairs and op-mode pairs without a full KEM, and
//! checking two encryption contexts agree by round-tripping messages through
//! them.

#![cfg(test)]

extern crate std;

use crate::{
    aead::Aead,
    context::{ReceiverContext, SenderContext},
    kdf::Kdf as KdfTrait,
    kem::Kem as KemTrait,
    kex::{KeyExchange, Serializable},
    op_mode::{OpModeR, OpModeS, PskBundle},
};

use generic_array::GenericArray;
use rand::{rngs::StdRng, CryptoRng, Rng, RngCore, SeedableRng};

/// Returns a random 32-byte buffer, usable as a PSK or PSK ID in tests.
pub(crate) fn gen_rand_buf() -> [u8; 32] {
    let mut csprng = StdRng::from_entropy();
    let mut buf = [0u8; 32];
    csprng.fill_bytes(&mut buf);
    buf
}

/// Generates a keypair directly from a [`KeyExchange`] group, without going
/// through a [`KemTrait`]. The ciphersuite ID fed to `derive_keypair` is
/// nonsense; the result is fine for any test that doesn't check against an
/// official KAT.
pub(crate) fn kex_gen_keypair<Kex: KeyExchange, R: CryptoRng + RngCore>(
    csprng: &mut R,
) -> (Kex::PrivateKey, Kex::PublicKey) {
    let mut ikm: GenericArray<u8, <Kex::PrivateKey as Serializable>::OutputSize> =
        GenericArray::default();
    csprng.fill_bytes(&mut ikm);
    Kex::derive_keypair::<crate::kdf::HkdfSha512>(b"31337", &ikm)
}

#[derive(Clone, Copy)]
pub(crate) enum OpModeKind {
    Base,
    Auth,
    Psk,
    AuthPsk,
}

/// Builds a mutually agreeing `(OpModeS, OpModeR)` pair of the given kind.
pub(crate) fn new_op_mode_pair<'a, Kex: KeyExchange>(
    kind: OpModeKind,
    psk: &'a [u8],
    psk_id: &'a [u8],
) -> (OpModeS<'a, Kex>, OpModeR<'a, Kex>) {
    let mut csprng = StdRng::from_entropy();
    let (sk_sender_id, pk_sender_id) = kex_gen_keypair::<Kex, _>(&mut csprng);
    let psk_bundle = PskBundle { psk, psk_id };

    match kind {
        OpModeKind::Base => (OpModeS::Base, OpModeR::Base),
        OpModeKind::Psk => (OpModeS::Psk(psk_bundle), OpModeR::Psk(psk_bundle)),
        OpModeKind::Auth => (
            OpModeS::Auth((sk_sender_id, pk_sender_id.clone())),
            OpModeR::Auth(pk_sender_id),
        ),
        OpModeKind::AuthPsk => (
            OpModeS::AuthPsk((sk_sender_id, pk_sender_id.clone()), psk_bundle),
            OpModeR::AuthPsk(pk_sender_id, psk_bundle),
        ),
    }
}

/// Round-trips 256 random messages through `sender`/`receiver` and returns
/// whether every one of them opened to what was sealed. Used to check that
/// two contexts derived from (supposedly) the same inputs actually agree.
pub(crate) fn ctx_agrees<A: Aead, Kdf: KdfTrait, Kem: KemTrait>(
    sender: &mut SenderContext<A, Kdf, Kem>,
    receiver: &mut ReceiverContext<A, Kdf, Kem>,
) -> bool {
    let mut csprng = StdRng::from_entropy();

    for _ in 0..256 {
        let msg = {
            let len = csprng.gen::<u8>();
            let mut buf = std::vec![0u8; len as usize];
            csprng.fill_bytes(&mut buf);
            buf
        };
        let aad = {
            let len = csprng.gen::<u8>();
            let mut buf = std::vec![0u8; len as usize];
            csprng.fill_bytes(&mut buf);
            buf
        };

        let ciphertext = match sender.seal(&msg, &aad) {
            Ok(ct) => ct,
            Err(_) => return false,
        };
        let plaintext = match receiver.open(&ciphertext, &aad) {
            Ok(pt) => pt,
            Err(_) => return false,
        };

        if plaintext != msg {
            return false;
        }
    }

    true
}
