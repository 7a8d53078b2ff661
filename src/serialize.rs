//! `Marshal`/`Unmarshal`: persisting a live [`SenderContext`]/[`ReceiverContext`]
//! to bytes and rebuilding it in a new process. Net new relative to the
//! teacher, which never serializes a context; the wire format follows the
//! same manual, length-prefixed, `GenericArray`-backed style already used by
//! [`crate::aead::mix_nonce`] and the labeled KDF helpers, rather than
//! reaching for a serde-based encoding.

use crate::{
    aead::{Aead, AeadKey, AeadNonce, Seq},
    context::{Context, ContextParams, ExporterSecret, SetupParams, MAX_KEY_SCHEDULE_CONTEXT_LEN},
    kdf::{Kdf as KdfTrait, KdfOutputSize, MAX_DIGEST_SIZE},
    kem::{EncappedKey, Kem as KemTrait},
    kex::{Deserializable, Serializable},
    HpkeError, ReceiverContext, SenderContext,
};

use alloc::vec::Vec;
use byteorder::{BigEndian, ByteOrder};
use generic_array::{ArrayLength, GenericArray};

const VERSION: u8 = 0x01;

/// Which half of a context a [`MarshalledContext`] blob holds. Checked on
/// unmarshal so a sender blob can't silently be restored as a receiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Role {
    Sender = 0x00,
    Receiver = 0x01,
}

/// The bytes produced by [`SenderContext::marshal`]/[`ReceiverContext::marshal`].
/// Opaque: callers that need to persist or transmit it should go through
/// [`MarshalledContext::as_bytes`], not assume anything about its layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarshalledContext(Vec<u8>);

impl MarshalledContext {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl core::ops::Deref for MarshalledContext {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

fn write_lp(buf: &mut Vec<u8>, data: &[u8]) {
    let len = data.len() as u16;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(data);
}

/// Reads a length-prefixed field, advancing `cursor` past it.
fn read_lp<'a>(cursor: &mut &'a [u8]) -> Result<&'a [u8], HpkeError> {
    if cursor.len() < 2 {
        return Err(HpkeError::MalformedSerialization);
    }
    let len = BigEndian::read_u16(cursor) as usize;
    *cursor = &cursor[2..];
    if cursor.len() < len {
        return Err(HpkeError::MalformedSerialization);
    }
    let (data, rest) = cursor.split_at(len);
    *cursor = rest;
    Ok(data)
}

fn read_fixed<N: ArrayLength<u8>>(slice: &[u8]) -> Result<GenericArray<u8, N>, HpkeError> {
    if slice.len() != N::to_usize() {
        return Err(HpkeError::MalformedSerialization);
    }
    Ok(GenericArray::clone_from_slice(slice))
}

// Marshal(ctx):
//   version || role || KEMID || KDFID || AEADID || seq ||
//   lp(exporter_secret) || lp(key) || lp(base_nonce) ||
//   lp(psk_id_hash) || lp(info_hash) || lp(enc) ||
//   lp(key_schedule_context) || lp(secret)
pub(crate) fn marshal_context<A: Aead, Kdf: KdfTrait, Kem: KemTrait>(
    role: Role,
    ctx: &Context<A, Kdf, Kem>,
) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.push(VERSION);
    buf.push(role as u8);
    buf.extend_from_slice(&Kem::KEM_ID.to_be_bytes());
    buf.extend_from_slice(&Kdf::KDF_ID.to_be_bytes());
    buf.extend_from_slice(&A::AEAD_ID.to_be_bytes());
    buf.extend_from_slice(&ctx.seq.0.to_be_bytes());

    write_lp(&mut buf, ctx.exporter_secret.as_slice());
    write_lp(&mut buf, ctx.key.as_slice());
    write_lp(&mut buf, ctx.base_nonce.as_slice());

    write_lp(&mut buf, ctx.setup_params.psk_id_hash.as_slice());
    write_lp(&mut buf, ctx.setup_params.info_hash.as_slice());
    write_lp(&mut buf, ctx.setup_params.enc.to_bytes().as_slice());

    let (ksc_buf, ksc_len) = &ctx.context_params.key_schedule_context;
    write_lp(&mut buf, &ksc_buf[..*ksc_len]);
    let (secret_buf, secret_len) = &ctx.context_params.secret;
    write_lp(&mut buf, &secret_buf[..*secret_len]);

    buf
}

pub(crate) fn unmarshal_context<A: Aead, Kdf: KdfTrait, Kem: KemTrait>(
    bytes: &[u8],
    expected_role: Role,
) -> Result<Context<A, Kdf, Kem>, HpkeError> {
    let mut cursor = bytes;

    if cursor.len() < 1 + 1 + 2 + 2 + 2 + 8 {
        return Err(HpkeError::MalformedSerialization);
    }

    let (version, rest) = cursor.split_at(1);
    if version[0] != VERSION {
        return Err(HpkeError::MalformedSerialization);
    }
    cursor = rest;

    let (role_byte, rest) = cursor.split_at(1);
    if role_byte[0] != expected_role as u8 {
        return Err(HpkeError::MalformedSerialization);
    }
    cursor = rest;

    let (ids, rest) = cursor.split_at(6);
    let kem_id = BigEndian::read_u16(&ids[0..2]);
    let kdf_id = BigEndian::read_u16(&ids[2..4]);
    let aead_id = BigEndian::read_u16(&ids[4..6]);
    if kem_id != Kem::KEM_ID || kdf_id != Kdf::KDF_ID || aead_id != A::AEAD_ID {
        return Err(HpkeError::MalformedSerialization);
    }
    cursor = rest;

    let (seq_bytes, rest) = cursor.split_at(8);
    let seq = BigEndian::read_u64(seq_bytes);
    cursor = rest;

    let exporter_secret: ExporterSecret<Kdf> = read_fixed::<KdfOutputSize<Kdf>>(read_lp(&mut cursor)?)?;
    let key: AeadKey<A> = read_fixed(read_lp(&mut cursor)?)?;
    let base_nonce: AeadNonce<A> = read_fixed(read_lp(&mut cursor)?)?;

    let psk_id_hash: GenericArray<u8, KdfOutputSize<Kdf>> = read_fixed(read_lp(&mut cursor)?)?;
    let info_hash: GenericArray<u8, KdfOutputSize<Kdf>> = read_fixed(read_lp(&mut cursor)?)?;
    let enc = EncappedKey::<Kem>::from_bytes(read_lp(&mut cursor)?)
        .map_err(|_| HpkeError::MalformedSerialization)?;

    let ksc_slice = read_lp(&mut cursor)?;
    if ksc_slice.len() > MAX_KEY_SCHEDULE_CONTEXT_LEN {
        return Err(HpkeError::MalformedSerialization);
    }
    let mut ksc_buf = [0u8; MAX_KEY_SCHEDULE_CONTEXT_LEN];
    ksc_buf[..ksc_slice.len()].copy_from_slice(ksc_slice);

    let secret_slice = read_lp(&mut cursor)?;
    if secret_slice.len() > MAX_DIGEST_SIZE {
        return Err(HpkeError::MalformedSerialization);
    }
    let mut secret_buf = [0u8; MAX_DIGEST_SIZE];
    secret_buf[..secret_slice.len()].copy_from_slice(secret_slice);

    if !cursor.is_empty() {
        return Err(HpkeError::MalformedSerialization);
    }

    let setup_params = SetupParams {
        psk_id_hash,
        info_hash,
        enc,
    };
    let context_params = ContextParams {
        key_schedule_context: (ksc_buf, ksc_slice.len()),
        secret: (secret_buf, secret_slice.len()),
    };

    let mut ctx = Context::new(key, base_nonce, exporter_secret, setup_params, context_params);
    ctx.seq = Seq(seq);
    Ok(ctx)
}

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> SenderContext<A, Kdf, Kem> {
    /// Serializes this context so it can be rebuilt with [`unmarshal_sender`]
    /// in a new process, continuing from the same `seq`.
    pub fn marshal(&self) -> MarshalledContext {
        MarshalledContext(marshal_context(Role::Sender, &self.0))
    }
}

impl<A: Aead, Kdf: KdfTrait, Kem: KemTrait> ReceiverContext<A, Kdf, Kem> {
    /// Serializes this context so it can be rebuilt with
    /// [`unmarshal_receiver`] in a new process, continuing from the same
    /// `seq`.
    pub fn marshal(&self) -> MarshalledContext {
        MarshalledContext(marshal_context(Role::Receiver, &self.0))
    }
}

/// Rebuilds a [`SenderContext`] from bytes produced by
/// [`SenderContext::marshal`]. The caller must already know the ciphersuite
/// statically; if it's only known at runtime, go through
/// [`crate::suite::unmarshal_dyn`] instead.
pub fn unmarshal_sender<A: Aead, Kdf: KdfTrait, Kem: KemTrait>(
    bytes: &[u8],
) -> Result<SenderContext<A, Kdf, Kem>, HpkeError> {
    unmarshal_context(bytes, Role::Sender).map(SenderContext::from)
}

/// Rebuilds a [`ReceiverContext`] from bytes produced by
/// [`ReceiverContext::marshal`].
pub fn unmarshal_receiver<A: Aead, Kdf: KdfTrait, Kem: KemTrait>(
    bytes: &[u8],
) -> Result<ReceiverContext<A, Kdf, Kem>, HpkeError> {
    unmarshal_context(bytes, Role::Receiver).map(ReceiverContext::from)
}
