//! AEAD schemes usable in an HPKE encryption context, plus the shared
//! nonce/key type aliases and sequence-number mixing used by [`crate::context`].

use aead::{AeadInPlace as BaseAead, KeyInit as BaseNewAead};
use byteorder::{BigEndian, ByteOrder};
use generic_array::GenericArray;

use crate::{
    kex::{Deserializable, Serializable},
    HpkeError,
};

/// An AEAD scheme usable in an HPKE encryption context.
pub trait Aead {
    /// The underlying AEAD implementation.
    type AeadImpl: BaseAead + BaseNewAead + Clone;

    /// The algorithm identifier for this AEAD.
    const AEAD_ID: u16;

    /// `true` only for [`ExportOnlyAead`]: a context built over this AEAD
    /// can never `seal`/`open`, only `export` (RFC 9180 §5.1.2).
    const IS_EXPORT_ONLY: bool = false;
}

/// AES-128-GCM.
pub struct AesGcm128 {}
impl Aead for AesGcm128 {
    type AeadImpl = aes_gcm::Aes128Gcm;
    const AEAD_ID: u16 = 0x0001;
}

/// AES-256-GCM.
pub struct AesGcm256 {}
impl Aead for AesGcm256 {
    type AeadImpl = aes_gcm::Aes256Gcm;
    const AEAD_ID: u16 = 0x0002;
}

/// ChaCha20-Poly1305.
pub struct ChaCha20Poly1305 {}
impl Aead for ChaCha20Poly1305 {
    type AeadImpl = chacha20poly1305::ChaCha20Poly1305;
    const AEAD_ID: u16 = 0x0003;
}

/// The `export-only` sentinel AEAD (RFC 9180 §5.1.2): a ciphersuite that only
/// ever uses `Export`, never `seal`/`open`. There is no real cipher behind
/// this; it exists so `suite::CipherSuite` can represent export-only
/// ciphersuites without inventing a second, parallel `Context` type.
pub struct ExportOnlyAead {}
impl Aead for ExportOnlyAead {
    // Nk = Nn = 0 is how RFC 9180 itself defines "no encryption algorithm".
    type AeadImpl = export_only::ExportOnlyImpl;
    const AEAD_ID: u16 = 0xffff;
    const IS_EXPORT_ONLY: bool = true;
}

/// A nonce is the same size as a sequence counter's XOR target, but is never
/// itself incremented.
pub(crate) type AeadNonce<A> = GenericArray<u8, <<A as Aead>::AeadImpl as BaseAead>::NonceSize>;
pub(crate) type AeadKey<A> = GenericArray<u8, <<A as Aead>::AeadImpl as aead::KeySizeUser>::KeySize>;

/// A sequence counter. `u64` rather than the AEAD's true nonce size: nothing
/// in HPKE's algorithm matrix uses nonces narrower than 64 bits, and
/// encrypting 2^64 messages in strict sequence isn't physically plausible.
#[derive(Default, Clone)]
pub(crate) struct Seq(pub(crate) u64);

// def Context.IncrementSeq():
//   if self.seq >= (1 << (8*Nn)) - 1:
//     raise MessageLimitReachedError
//   self.seq += 1
pub(crate) fn increment_seq(seq: &Seq) -> Option<Seq> {
    seq.0.checked_add(1).map(Seq)
}

// def Context.ComputeNonce(seq):
//   seq_bytes = I2OSP(seq, Nn)
//   return xor(self.nonce, seq_bytes)
pub(crate) fn mix_nonce<A: Aead>(base_nonce: &AeadNonce<A>, seq: &Seq) -> AeadNonce<A> {
    let mut seq_buf = AeadNonce::<A>::default();
    let seq_size = core::mem::size_of::<u64>();
    let nonce_size = base_nonce.len();
    BigEndian::write_u64(&mut seq_buf[nonce_size - seq_size..], seq.0);

    let mixed = base_nonce
        .iter()
        .zip(seq_buf.iter())
        .map(|(nonce_byte, seq_byte)| nonce_byte ^ seq_byte);
    GenericArray::from_exact_iter(mixed).expect("nonce and seq buffers are the same length")
}

/// An authenticated encryption tag.
pub struct AeadTag<A: Aead>(pub(crate) GenericArray<u8, <A::AeadImpl as BaseAead>::TagSize>);

impl<A: Aead> Serializable for AeadTag<A> {
    type OutputSize = <A::AeadImpl as BaseAead>::TagSize;

    fn to_bytes(&self) -> GenericArray<u8, Self::OutputSize> {
        self.0.clone()
    }
}

impl<A: Aead> Deserializable for AeadTag<A> {
    fn from_bytes(encoded: &[u8]) -> Result<Self, HpkeError> {
        if encoded.len() != Self::size() {
            Err(HpkeError::InvalidEncoding)
        } else {
            let mut arr = <GenericArray<u8, Self::OutputSize> as Default>::default();
            arr.copy_from_slice(encoded);
            Ok(AeadTag(arr))
        }
    }
}

/// A trivial `aead` crate implementation with zero-length key and nonce,
/// whose `encrypt`/`decrypt` always fail. Backs [`ExportOnlyAead`], which
/// must type-check as an `Aead` but is never actually invoked for seal/open
/// (callers get `HpkeError::OperationNotSupported` before reaching it; see
/// `context::Context::seal`/`open`).
mod export_only {
    use aead::{AeadCore, AeadInPlace, Error, Key, KeyInit, KeySizeUser};
    use generic_array::{typenum::U0, GenericArray};

    #[derive(Clone)]
    pub struct ExportOnlyImpl;

    impl KeySizeUser for ExportOnlyImpl {
        type KeySize = U0;
    }

    impl KeyInit for ExportOnlyImpl {
        fn new(_key: &Key<Self>) -> Self {
            ExportOnlyImpl
        }
    }

    impl AeadCore for ExportOnlyImpl {
        type NonceSize = U0;
        type TagSize = U0;
        type CiphertextOverhead = U0;
    }

    impl AeadInPlace for ExportOnlyImpl {
        fn encrypt_in_place_detached(
            &self,
            _nonce: &GenericArray<u8, Self::NonceSize>,
            _associated_data: &[u8],
            _buffer: &mut [u8],
        ) -> Result<aead::Tag<Self>, Error> {
            Err(Error)
        }

        fn decrypt_in_place_detached(
            &self,
            _nonce: &GenericArray<u8, Self::NonceSize>,
            _associated_data: &[u8],
            _buffer: &mut [u8],
            _tag: &aead::Tag<Self>,
        ) -> Result<(), Error> {
            Err(Error)
        }
    }
}
