//! Diffie-Hellman key exchange, abstracted over curve implementations.
//!
//! [`KeyExchange`] is consumed by [`crate::kem::dhkem`] to build the four
//! concrete DHKEMs this crate ships. Each curve lives in its own submodule,
//! gated by the Cargo feature of the same name.

use crate::{kdf::Kdf as KdfTrait, util::KemSuiteId, HpkeError};
use generic_array::{ArrayLength, GenericArray};

#[cfg(feature = "x25519")]
pub mod x25519;

#[cfg(any(feature = "p256", feature = "p521"))]
pub mod nistp;

#[cfg(feature = "x448")]
pub mod x448;

/// A type with a known, fixed-size byte encoding.
pub trait Serializable {
    type OutputSize: ArrayLength<u8>;

    fn to_bytes(&self) -> GenericArray<u8, Self::OutputSize>;

    fn size() -> usize {
        Self::OutputSize::to_usize()
    }
}

/// The dual of [`Serializable`]: parses a value back out of its fixed-size
/// byte encoding, rejecting malformed or off-curve input.
pub trait Deserializable: Serializable + Sized {
    fn from_bytes(encoded: &[u8]) -> Result<Self, HpkeError>;
}

/// A Diffie-Hellman group usable as the basis of a DHKEM (RFC 9180 §4.1).
pub trait KeyExchange {
    #[doc(hidden)]
    type PublicKey: Clone + Serializable + Deserializable;
    #[doc(hidden)]
    type PrivateKey: Clone + Serializable + Deserializable;
    #[doc(hidden)]
    type KexResult: Serializable;

    /// Computes the public key corresponding to a private key.
    #[doc(hidden)]
    fn sk_to_pk(sk: &Self::PrivateKey) -> Self::PublicKey;

    /// Performs the DH operation. Returns `HpkeError::InvalidKeyExchange` if
    /// and only if the result is the group's all-zero/identity element, as
    /// RFC 9180 §7.1.4 requires callers to check.
    #[doc(hidden)]
    fn kex(sk: &Self::PrivateKey, pk: &Self::PublicKey) -> Result<Self::KexResult, HpkeError>;

    /// `DeriveKeyPair`: deterministically derives a keypair from input keying
    /// material (RFC 9180 §7.1.3). `ikm` should have as much entropy as a
    /// secret key for this group.
    #[doc(hidden)]
    fn derive_keypair<Kdf: KdfTrait>(
        suite_id: &KemSuiteId,
        ikm: &[u8],
    ) -> (Self::PrivateKey, Self::PublicKey);
}
