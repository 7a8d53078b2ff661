//! Key Encapsulation Mechanisms (RFC 9180 §4): derives a shared secret
//! between a sender and a receiver's public key, producing an `enc` value
//! the receiver uses to recover the same secret.
//!
//! Every concrete KEM this crate ships is a DHKEM ([`dhkem`]) instantiated
//! over one of the four curves in [`crate::kex`]: the [`Kem`] trait itself is
//! curve-agnostic, pinning only a [`KeyExchange`] group and the internal KDF
//! RFC 9180 uses for `ExtractAndExpand` (never the ciphersuite's own KDF;
//! see §4.1).

pub(crate) mod dhkem;

use crate::{
    kdf::{Kdf as KdfTrait, KdfOutputSize},
    kex::{KeyExchange, Serializable},
};
use generic_array::GenericArray;
use rand_core::{CryptoRng, RngCore};

/// A Key Encapsulation Mechanism.
///
/// This crate only ships DHKEM instantiations, so `Kem` is little more than a
/// `(Kex, InternalKdf, KEM_ID)` bundle; [`dhkem`] supplies the actual
/// `Encap`/`Decap`/`AuthEncap`/`AuthDecap` logic generically over any `Kem`.
pub trait Kem: Sized {
    /// The Diffie-Hellman group this KEM is built on.
    #[doc(hidden)]
    type Kex: KeyExchange;

    /// The KDF RFC 9180 fixes for this KEM's own internal
    /// `LabeledExtract`/`LabeledExpand` calls (`ExtractAndExpand` and
    /// `DeriveKeyPair`). This is *not* necessarily the KDF the surrounding
    /// ciphersuite picked for its key schedule; RFC 9180 Table 2 pins one
    /// per KEM regardless of the outer suite's `KDFID`.
    #[doc(hidden)]
    type InternalKdf: KdfTrait;

    /// Whether this KEM can run in `Auth`/`AuthPsk` mode. Every DHKEM can
    /// (the construction is inherently symmetric in sender/receiver DH
    /// roles); a future non-Diffie-Hellman KEM might not be able to, in
    /// which case `setup_auth_s`/`setup_auth_r` must return
    /// `HpkeError::ModeNotSupported` rather than silently doing the wrong
    /// thing.
    #[doc(hidden)]
    const SUPPORTS_AUTH: bool = true;

    /// The algorithm identifier for this KEM (RFC 9180 §7.1).
    const KEM_ID: u16;

    /// `DeriveKeyPair` (RFC 9180 §7.1.3): deterministically derives a keypair
    /// from input keying material, using this KEM's fixed internal KDF.
    fn derive_keypair(
        ikm: &[u8],
    ) -> (
        <Self::Kex as KeyExchange>::PrivateKey,
        <Self::Kex as KeyExchange>::PublicKey,
    ) {
        <Self::Kex as KeyExchange>::derive_keypair::<Self::InternalKdf>(
            &crate::util::kem_suite_id::<Self>(),
            ikm,
        )
    }

    /// `GenerateKeyPair`: samples fresh, uniformly random input keying
    /// material and runs it through [`Kem::derive_keypair`].
    fn gen_keypair<R: CryptoRng + RngCore>(
        csprng: &mut R,
    ) -> (
        <Self::Kex as KeyExchange>::PrivateKey,
        <Self::Kex as KeyExchange>::PublicKey,
    ) {
        let mut ikm = GenericArray::<u8, <<Self::Kex as KeyExchange>::PrivateKey as Serializable>::OutputSize>::default();
        csprng.fill_bytes(&mut ikm);
        let keypair = Self::derive_keypair(&ikm);
        use zeroize::Zeroize;
        ikm.zeroize();
        keypair
    }
}

/// The encapsulated key a sender's `Encap`/`AuthEncap` produces and a
/// receiver's `Decap`/`AuthDecap` consumes. For a DHKEM this is just the
/// sender's ephemeral public key.
pub(crate) type EncappedKey<Kem> = <<Kem as self::Kem>::Kex as KeyExchange>::PublicKey;

/// The shared secret a KEM produces, sized by its internal KDF's hash output
/// (RFC 9180 Table 2's `Nsecret` column, which always equals that KDF's
/// `Nh`).
pub(crate) type SharedSecret<Kem> = GenericArray<u8, KdfOutputSize<<Kem as self::Kem>::InternalKdf>>;

#[cfg(feature = "x25519")]
pub use x25519_kem::X25519HkdfSha256;
#[cfg(feature = "x25519")]
mod x25519_kem {
    use super::Kem;

    /// DHKEM(X25519, HKDF-SHA256).
    pub struct X25519HkdfSha256 {}
    impl Kem for X25519HkdfSha256 {
        type Kex = crate::kex::x25519::X25519;
        type InternalKdf = crate::kdf::HkdfSha256;
        const KEM_ID: u16 = 0x0020;
    }
}

#[cfg(feature = "p256")]
pub use p256_kem::DhP256HkdfSha256;
#[cfg(feature = "p256")]
mod p256_kem {
    use super::Kem;

    /// DHKEM(P-256, HKDF-SHA256).
    pub struct DhP256HkdfSha256 {}
    impl Kem for DhP256HkdfSha256 {
        type Kex = crate::kex::nistp::DhP256;
        type InternalKdf = crate::kdf::HkdfSha256;
        const KEM_ID: u16 = 0x0010;
    }
}

#[cfg(feature = "p521")]
pub use p521_kem::DhP521HkdfSha512;
#[cfg(feature = "p521")]
mod p521_kem {
    use super::Kem;

    /// DHKEM(P-521, HKDF-SHA512).
    pub struct DhP521HkdfSha512 {}
    impl Kem for DhP521HkdfSha512 {
        type Kex = crate::kex::nistp::DhP521;
        type InternalKdf = crate::kdf::HkdfSha512;
        const KEM_ID: u16 = 0x0012;
    }
}

#[cfg(feature = "x448")]
pub use x448_kem::DhX448HkdfSha512;
#[cfg(feature = "x448")]
mod x448_kem {
    use super::Kem;

    /// DHKEM(X448, HKDF-SHA512).
    pub struct DhX448HkdfSha512 {}
    impl Kem for DhX448HkdfSha512 {
        type Kex = crate::kex::x448::X448;
        type InternalKdf = crate::kdf::HkdfSha512;
        const KEM_ID: u16 = 0x0021;
    }
}
