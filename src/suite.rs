//! A runtime-typed view on top of the compile-time-typed core: looking up a
//! [`CipherSuite`] from three wire identifiers, and rebuilding a context from
//! a [`crate::serialize::MarshalledContext`] blob whose ciphersuite is only
//! known once the bytes are in hand. Net new relative to the teacher, which
//! only ever dispatches `(Aead, Kdf, Kem)` as compile-time type parameters;
//! the dispatch macro below is the same `@tup1`/`@tup2`/`@tup3` rollup style
//! `kat_tests.rs` uses to sweep a test vector across every supported
//! ciphersuite.

use crate::{
    aead::{Aead, AesGcm128, AesGcm256, ChaCha20Poly1305, ExportOnlyAead},
    kdf::{HkdfSha256, HkdfSha384, HkdfSha512, Kdf as KdfTrait},
    kem::Kem as KemTrait,
    serialize::{unmarshal_receiver, unmarshal_sender, MarshalledContext, Role},
    HpkeError, ReceiverContext, SenderContext,
};

use alloc::{boxed::Box, vec::Vec};
use byteorder::{BigEndian, ByteOrder};

/// `"HPKE" || KEMID || KDFID || AEADID`. Same domain separator as
/// [`crate::util::full_suite_id`], computed from runtime IDs instead of
/// types, since [`CipherSuite`] exists precisely for callers that don't have
/// the types.
fn suite_id_bytes(kem_id: u16, kdf_id: u16, aead_id: u16) -> [u8; 10] {
    let mut id = [0u8; 10];
    id[0..4].copy_from_slice(b"HPKE");
    id[4..6].copy_from_slice(&kem_id.to_be_bytes());
    id[6..8].copy_from_slice(&kdf_id.to_be_bytes());
    id[8..10].copy_from_slice(&aead_id.to_be_bytes());
    id
}

fn kem_id_supported(kem_id: u16) -> bool {
    #[cfg(feature = "x25519")]
    if kem_id == crate::kem::X25519HkdfSha256::KEM_ID {
        return true;
    }
    #[cfg(feature = "p256")]
    if kem_id == crate::kem::DhP256HkdfSha256::KEM_ID {
        return true;
    }
    #[cfg(feature = "p521")]
    if kem_id == crate::kem::DhP521HkdfSha512::KEM_ID {
        return true;
    }
    #[cfg(feature = "x448")]
    if kem_id == crate::kem::DhX448HkdfSha512::KEM_ID {
        return true;
    }
    let _ = kem_id;
    false
}

fn kdf_id_supported(kdf_id: u16) -> bool {
    matches!(
        kdf_id,
        HkdfSha256::KDF_ID | HkdfSha384::KDF_ID | HkdfSha512::KDF_ID
    )
}

fn aead_id_supported(aead_id: u16) -> bool {
    matches!(
        aead_id,
        AesGcm128::AEAD_ID | AesGcm256::AEAD_ID | ChaCha20Poly1305::AEAD_ID | ExportOnlyAead::AEAD_ID
    )
}

/// An immutable bundle of the three wire identifiers a ciphersuite is made
/// of, plus the `suite_id` they determine. Doesn't carry the KEM/KDF/AEAD
/// types themselves (`Kem::gen_keypair` is generic over its RNG, which rules
/// `dyn Kem` out) — it's a validated triple for protocol negotiation and
/// dynamic deserialization, not a substitute for the compile-time core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CipherSuite {
    pub kem_id: u16,
    pub kdf_id: u16,
    pub aead_id: u16,
    suite_id: [u8; 10],
}

impl CipherSuite {
    /// `"HPKE" || KEMID || KDFID || AEADID`.
    pub fn suite_id(&self) -> &[u8; 10] {
        &self.suite_id
    }
}

/// `AssembleCipherSuite`: looks up the three wire identifiers against the
/// algorithms this crate actually ships (respecting feature gating on the
/// KEM side), returning [`HpkeError::UnknownSuite`] if any one of them isn't
/// implemented here.
pub fn assemble_cipher_suite(kem_id: u16, kdf_id: u16, aead_id: u16) -> Result<CipherSuite, HpkeError> {
    if !kem_id_supported(kem_id) || !kdf_id_supported(kdf_id) || !aead_id_supported(aead_id) {
        return Err(HpkeError::UnknownSuite);
    }
    Ok(CipherSuite {
        kem_id,
        kdf_id,
        aead_id,
        suite_id: suite_id_bytes(kem_id, kdf_id, aead_id),
    })
}

/// The object-safe remainder of [`SenderContext`] once its ciphersuite is
/// erased: every method [`DynSenderContext`] forwards to.
trait ErasedSenderContext {
    fn seal(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError>;
    fn export_to_vec(&self, exporter_context: &[u8], len: usize) -> Result<Vec<u8>, HpkeError>;
    fn marshal(&self) -> MarshalledContext;
}

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> ErasedSenderContext for SenderContext<A, Kdf, Kem> {
    fn seal(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError> {
        SenderContext::seal(self, plaintext, aad)
    }
    fn export_to_vec(&self, exporter_context: &[u8], len: usize) -> Result<Vec<u8>, HpkeError> {
        SenderContext::export_to_vec(self, exporter_context, len)
    }
    fn marshal(&self) -> MarshalledContext {
        SenderContext::marshal(self)
    }
}

/// The object-safe remainder of [`ReceiverContext`] once its ciphersuite is
/// erased.
trait ErasedReceiverContext {
    fn open(&mut self, ciphertext_and_tag: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError>;
    fn export_to_vec(&self, exporter_context: &[u8], len: usize) -> Result<Vec<u8>, HpkeError>;
    fn marshal(&self) -> MarshalledContext;
}

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> ErasedReceiverContext for ReceiverContext<A, Kdf, Kem> {
    fn open(&mut self, ciphertext_and_tag: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError> {
        ReceiverContext::open(self, ciphertext_and_tag, aad)
    }
    fn export_to_vec(&self, exporter_context: &[u8], len: usize) -> Result<Vec<u8>, HpkeError> {
        ReceiverContext::export_to_vec(self, exporter_context, len)
    }
    fn marshal(&self) -> MarshalledContext {
        ReceiverContext::marshal(self)
    }
}

/// A [`SenderContext`] whose ciphersuite was only known at runtime, e.g.
/// rebuilt from a [`MarshalledContext`] by [`unmarshal_dyn`].
pub struct DynSenderContext(Box<dyn ErasedSenderContext>);

impl DynSenderContext {
    pub fn seal(&mut self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError> {
        self.0.seal(plaintext, aad)
    }
    pub fn export_to_vec(&self, exporter_context: &[u8], len: usize) -> Result<Vec<u8>, HpkeError> {
        self.0.export_to_vec(exporter_context, len)
    }
    pub fn marshal(&self) -> MarshalledContext {
        self.0.marshal()
    }
}

/// A [`ReceiverContext`] whose ciphersuite was only known at runtime.
pub struct DynReceiverContext(Box<dyn ErasedReceiverContext>);

impl DynReceiverContext {
    pub fn open(&mut self, ciphertext_and_tag: &[u8], aad: &[u8]) -> Result<Vec<u8>, HpkeError> {
        self.0.open(ciphertext_and_tag, aad)
    }
    pub fn export_to_vec(&self, exporter_context: &[u8], len: usize) -> Result<Vec<u8>, HpkeError> {
        self.0.export_to_vec(exporter_context, len)
    }
    pub fn marshal(&self) -> MarshalledContext {
        self.0.marshal()
    }
}

/// The result of [`unmarshal_dyn`]: which half of the channel the bytes held.
pub enum DynContext {
    Sender(DynSenderContext),
    Receiver(DynReceiverContext),
}

// Tries every (Kdf, Aead) pair against a single, already-resolved Kem type.
// This is the innermost ring of the dispatch; the outer ring (over Kem) is
// feature-gated and lives in `unmarshal_dyn` itself, since each arm there
// needs its own `#[cfg(feature = "...")]`.
fn try_unmarshal_kem<Kem: KemTrait>(
    role: Role,
    kdf_id: u16,
    aead_id: u16,
    bytes: &[u8],
) -> Option<Result<DynContext, HpkeError>> {
    macro_rules! dispatch_kdf_aead {
        ($kdf_tup:tt, $aead_tup:tt) => {
            dispatch_kdf_aead!(@kdf $kdf_tup, $aead_tup)
        };
        (@kdf ($( $kdf_ty:ty ),*), $aead_tup:tt) => {
            $(
                dispatch_kdf_aead!(@aead $kdf_ty, $aead_tup);
            )*
        };
        (@aead $kdf_ty:ty, ($( $aead_ty:ty ),*)) => {
            $(
                if kdf_id == <$kdf_ty as KdfTrait>::KDF_ID && aead_id == <$aead_ty as Aead>::AEAD_ID {
                    return Some(match role {
                        Role::Sender => unmarshal_sender::<$aead_ty, $kdf_ty, Kem>(bytes)
                            .map(|ctx| DynContext::Sender(DynSenderContext(Box::new(ctx)))),
                        Role::Receiver => unmarshal_receiver::<$aead_ty, $kdf_ty, Kem>(bytes)
                            .map(|ctx| DynContext::Receiver(DynReceiverContext(Box::new(ctx)))),
                    });
                }
            )*
        };
    }

    dispatch_kdf_aead!(
        (HkdfSha256, HkdfSha384, HkdfSha512),
        (AesGcm128, AesGcm256, ChaCha20Poly1305, ExportOnlyAead)
    );
    None
}

fn peek_header(bytes: &[u8]) -> Result<(Role, u16, u16, u16), HpkeError> {
    if bytes.len() < 8 {
        return Err(HpkeError::MalformedSerialization);
    }
    if bytes[0] != 0x01 {
        return Err(HpkeError::MalformedSerialization);
    }
    let role = match bytes[1] {
        0x00 => Role::Sender,
        0x01 => Role::Receiver,
        _ => return Err(HpkeError::MalformedSerialization),
    };
    let kem_id = BigEndian::read_u16(&bytes[2..4]);
    let kdf_id = BigEndian::read_u16(&bytes[4..6]);
    let aead_id = BigEndian::read_u16(&bytes[6..8]);
    Ok((role, kem_id, kdf_id, aead_id))
}

/// Rebuilds whichever half of a context `bytes` holds, looking up the
/// ciphersuite from the identifiers `bytes` itself carries rather than from a
/// caller-supplied type parameter. This is the only way to `Unmarshal` a
/// context whose ciphersuite wasn't pinned at compile time; callers who do
/// know the types statically should prefer [`unmarshal_sender`]/
/// [`unmarshal_receiver`] directly, which skip the dispatch below entirely.
pub fn unmarshal_dyn(bytes: &[u8]) -> Result<DynContext, HpkeError> {
    let (role, kem_id, kdf_id, aead_id) = peek_header(bytes)?;

    #[cfg(feature = "x25519")]
    if kem_id == crate::kem::X25519HkdfSha256::KEM_ID {
        return try_unmarshal_kem::<crate::kem::X25519HkdfSha256>(role, kdf_id, aead_id, bytes)
            .unwrap_or(Err(HpkeError::UnknownSuite));
    }
    #[cfg(feature = "p256")]
    if kem_id == crate::kem::DhP256HkdfSha256::KEM_ID {
        return try_unmarshal_kem::<crate::kem::DhP256HkdfSha256>(role, kdf_id, aead_id, bytes)
            .unwrap_or(Err(HpkeError::UnknownSuite));
    }
    #[cfg(feature = "p521")]
    if kem_id == crate::kem::DhP521HkdfSha512::KEM_ID {
        return try_unmarshal_kem::<crate::kem::DhP521HkdfSha512>(role, kdf_id, aead_id, bytes)
            .unwrap_or(Err(HpkeError::UnknownSuite));
    }
    #[cfg(feature = "x448")]
    if kem_id == crate::kem::DhX448HkdfSha512::KEM_ID {
        return try_unmarshal_kem::<crate::kem::DhX448HkdfSha512>(role, kdf_id, aead_id, bytes)
            .unwrap_or(Err(HpkeError::UnknownSuite));
    }

    Err(HpkeError::UnknownSuite)
}
