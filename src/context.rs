//! The sender/receiver encryption context RFC 9180 §5.2 sets up: sealing and
//! opening AEAD messages with a sequence-numbered nonce, and exporting
//! secrets independent of the sealing/opening sequence.

use crate::{
    aead::{increment_seq, mix_nonce, Aead, AeadKey, AeadNonce, AeadTag, Seq},
    kdf::{Kdf as KdfTrait, KdfOutputSize},
    kem::{EncappedKey, Kem as KemTrait},
    kex::{Deserializable, Serializable},
    HpkeError,
};

use aead::{AeadInPlace, KeyInit};
use generic_array::GenericArray;
use zeroize::Zeroize;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// An HPKE `exporter_secret`: independent key material derived alongside
/// `key`/`base_nonce`, used only by [`Context::export`].
pub type ExporterSecret<Kdf> = GenericArray<u8, KdfOutputSize<Kdf>>;

/// The longest `key_schedule_context` this crate ever builds: `mode` (1
/// byte) followed by two KDF outputs (at most 64 bytes each, for
/// HKDF-SHA512).
pub(crate) const MAX_KEY_SCHEDULE_CONTEXT_LEN: usize = 1 + 2 * crate::kdf::MAX_DIGEST_SIZE;

/// `setup_params`: the inputs to the key schedule that came from the KEM,
/// retained on the context for serialization and test-vector inspection
/// (RFC 9180's reference implementation calls this out explicitly in its
/// `Context` data members).
pub(crate) struct SetupParams<Kdf: KdfTrait, Kem: KemTrait> {
    pub(crate) psk_id_hash: GenericArray<u8, KdfOutputSize<Kdf>>,
    pub(crate) info_hash: GenericArray<u8, KdfOutputSize<Kdf>>,
    pub(crate) enc: EncappedKey<Kem>,
}

impl<Kdf: KdfTrait, Kem: KemTrait> Drop for SetupParams<Kdf, Kem> {
    fn drop(&mut self) {
        self.psk_id_hash.as_mut_slice().zeroize();
        self.info_hash.as_mut_slice().zeroize();
    }
}

/// `key_schedule_context` and the `secret` it was mixed with, retained
/// alongside [`SetupParams`] for the same reason.
pub(crate) struct ContextParams {
    pub(crate) key_schedule_context: ([u8; MAX_KEY_SCHEDULE_CONTEXT_LEN], usize),
    pub(crate) secret: ([u8; crate::kdf::MAX_DIGEST_SIZE], usize),
}

impl Drop for ContextParams {
    fn drop(&mut self) {
        self.key_schedule_context.0.zeroize();
        self.secret.0.zeroize();
    }
}

/// The shared guts of [`SenderContext`] and [`ReceiverContext`]: everything
/// that doesn't depend on which side of the channel this endpoint is on.
pub(crate) struct Context<A: Aead, Kdf: KdfTrait, Kem: KemTrait> {
    pub(crate) key: AeadKey<A>,
    pub(crate) base_nonce: AeadNonce<A>,
    pub(crate) exporter_secret: ExporterSecret<Kdf>,
    pub(crate) seq: Seq,
    pub(crate) setup_params: SetupParams<Kdf, Kem>,
    pub(crate) context_params: ContextParams,
    encryptor: A::AeadImpl,
}

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> Context<A, Kdf, Kem> {
    pub(crate) fn new(
        key: AeadKey<A>,
        base_nonce: AeadNonce<A>,
        exporter_secret: ExporterSecret<Kdf>,
        setup_params: SetupParams<Kdf, Kem>,
        context_params: ContextParams,
    ) -> Self {
        let encryptor = A::AeadImpl::new(&key);
        Context {
            key,
            base_nonce,
            exporter_secret,
            seq: Seq::default(),
            setup_params,
            context_params,
            encryptor,
        }
    }

    /// `Context.Seal` run in place, returning the detached tag. `plaintext`
    /// is overwritten with the ciphertext.
    pub(crate) fn seal_in_place_detached(
        &mut self,
        plaintext: &mut [u8],
        aad: &[u8],
    ) -> Result<AeadTag<A>, HpkeError> {
        if A::IS_EXPORT_ONLY {
            return Err(HpkeError::OperationNotSupported);
        }

        let nonce = mix_nonce::<A>(&self.base_nonce, &self.seq);
        let tag = self
            .encryptor
            .encrypt_in_place_detached(&nonce, aad, plaintext)
            .map_err(|_| HpkeError::AuthenticationFailure)?;

        self.seq = increment_seq(&self.seq).ok_or(HpkeError::MessageLimitReached)?;
        Ok(AeadTag(tag))
    }

    /// `Context.Open` run in place, given the detached tag. `ciphertext` is
    /// overwritten with the plaintext on success; left untouched on failure.
    pub(crate) fn open_in_place_detached(
        &mut self,
        ciphertext: &mut [u8],
        aad: &[u8],
        tag: &AeadTag<A>,
    ) -> Result<(), HpkeError> {
        if A::IS_EXPORT_ONLY {
            return Err(HpkeError::OperationNotSupported);
        }

        let nonce = mix_nonce::<A>(&self.base_nonce, &self.seq);
        self.encryptor
            .decrypt_in_place_detached(&nonce, aad, ciphertext, &tag.0)
            .map_err(|_| HpkeError::AuthenticationFailure)?;

        self.seq = increment_seq(&self.seq).ok_or(HpkeError::MessageLimitReached)?;
        Ok(())
    }

    /// `Context.Export`: derives `len` bytes of secret key material bound to
    /// `exporter_context`, independent of the seal/open sequence number.
    pub(crate) fn export(&self, exporter_context: &[u8], out: &mut [u8]) -> Result<(), HpkeError> {
        use crate::kdf::LabeledExpand;
        use hkdf::Hkdf;

        let suite_id = crate::util::full_suite_id::<A, Kdf, Kem>();
        let hkdf_ctx = Hkdf::<Kdf::HashImpl>::from_prk(&self.exporter_secret)
            .expect("exporter_secret is always a valid PRK for its own hash function");
        hkdf_ctx
            .labeled_expand(&suite_id, b"sec", exporter_context, out)
            .map_err(|_| HpkeError::InvalidEncoding)
    }
}

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> Drop for Context<A, Kdf, Kem> {
    fn drop(&mut self) {
        self.key.as_mut_slice().zeroize();
        self.base_nonce.as_mut_slice().zeroize();
        self.exporter_secret.as_mut_slice().zeroize();
    }
}

/// A sender's view of an HPKE encryption context: can [`SenderContext::seal`]
/// and [`SenderContext::export`], but never opens.
pub struct SenderContext<A: Aead, Kdf: KdfTrait, Kem: KemTrait>(pub(crate) Context<A, Kdf, Kem>);

/// A receiver's view of an HPKE encryption context: can
/// [`ReceiverContext::open`] and [`ReceiverContext::export`], but never
/// seals.
pub struct ReceiverContext<A: Aead, Kdf: KdfTrait, Kem: KemTrait>(pub(crate) Context<A, Kdf, Kem>);

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> From<Context<A, Kdf, Kem>> for SenderContext<A, Kdf, Kem> {
    fn from(ctx: Context<A, Kdf, Kem>) -> Self {
        SenderContext(ctx)
    }
}

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> From<Context<A, Kdf, Kem>> for ReceiverContext<A, Kdf, Kem> {
    fn from(ctx: Context<A, Kdf, Kem>) -> Self {
        ReceiverContext(ctx)
    }
}

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> SenderContext<A, Kdf, Kem> {
    /// Encrypts `plaintext` in place, appending nothing; the tag is returned
    /// separately. This is the no-alloc primitive; see [`SenderContext::seal`]
    /// for an allocating convenience wrapper.
    pub fn seal_in_place_detached(&mut self, plaintext: &mut [u8], aad: &[u8]) -> Result<AeadTag<A>, HpkeError> {
        self.0.seal_in_place_detached(plaintext, aad)
    }

    /// Encrypts `plaintext`, returning a freshly allocated `plaintext || tag`
    /// blob.
    #[cfg(feature = "alloc")]
    pub fn seal(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError> {
        let mut buf = Vec::from(plaintext);
        let tag = self.seal_in_place_detached(&mut buf, aad)?;
        buf.extend_from_slice(tag.to_bytes().as_slice());
        Ok(buf)
    }

    /// `Context.Export`, writing `out.len()` bytes into `out`.
    pub fn export(&self, exporter_context: &[u8], out: &mut [u8]) -> Result<(), HpkeError> {
        self.0.export(exporter_context, out)
    }

    /// `Context.Export`, returning a freshly allocated `len`-byte buffer.
    #[cfg(feature = "alloc")]
    pub fn export_to_vec(&self, exporter_context: &[u8], len: usize) -> Result<Vec<u8>, HpkeError> {
        let mut out = alloc::vec![0u8; len];
        self.export(exporter_context, &mut out)?;
        Ok(out)
    }
}


impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> ReceiverContext<A, Kdf, Kem> {
    /// Decrypts `ciphertext` in place given the detached tag. This is the
    /// no-alloc primitive; see [`ReceiverContext::open`] for an allocating
    /// convenience wrapper.
    pub fn open_in_place_detached(
        &mut self,
        ciphertext: &mut [u8],
        aad: &[u8],
        tag: &AeadTag<A>,
    ) -> Result<(), HpkeError> {
        self.0.open_in_place_detached(ciphertext, aad, tag)
    }

    /// Decrypts a `ciphertext || tag` blob as produced by
    /// [`SenderContext::seal`], returning the freshly allocated plaintext.
    #[cfg(feature = "alloc")]
    pub fn open(&mut self, ciphertext_and_tag: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError> {
        let tag_len = AeadTag::<A>::size();
        if ciphertext_and_tag.len() < tag_len {
            return Err(HpkeError::InvalidEncoding);
        }
        let (ciphertext, tag_bytes) = ciphertext_and_tag.split_at(ciphertext_and_tag.len() - tag_len);
        let tag = AeadTag::<A>::from_bytes(tag_bytes)?;

        let mut buf = Vec::from(ciphertext);
        self.open_in_place_detached(&mut buf, aad, &tag)?;
        Ok(buf)
    }

    /// `Context.Export`, writing `out.len()` bytes into `out`.
    pub fn export(&self, exporter_context: &[u8], out: &mut [u8]) -> Result<(), HpkeError> {
        self.0.export(exporter_context, out)
    }

    /// `Context.Export`, returning a freshly allocated `len`-byte buffer.
    #[cfg(feature = "alloc")]
    pub fn export_to_vec(&self, exporter_context: &[u8], len: usize) -> Result<Vec<u8>, HpkeError> {
        let mut out = alloc::vec![0u8; len];
        self.export(exporter_context, &mut out)?;
        Ok(out)
    }
}
