//! HKDF-based key derivation, with the `LabeledExtract`/`LabeledExpand`
//! domain separation RFC 9180 §4.1 layers on top of plain HKDF.

use crate::util::concat_with_known_maxlen;

use digest::Digest;
use generic_array::GenericArray;
use hkdf::{Hkdf, HkdfExtract};

/// The longest digest size among the KDFs this crate implements (SHA-512's
/// 64 bytes). Used to size fixed buffers that need to hold "a PRK" or "a
/// hash output" generically across KDFs.
pub(crate) const MAX_DIGEST_SIZE: usize = 64;

/// A KDF usable in the HPKE key schedule and in `DeriveKeyPair`.
pub trait Kdf {
    /// The hash function HKDF is built on.
    type HashImpl: Digest + digest::OutputSizeUser;

    /// The algorithm identifier for this KDF.
    const KDF_ID: u16;
}

/// HKDF-SHA256.
pub struct HkdfSha256 {}
impl Kdf for HkdfSha256 {
    type HashImpl = sha2::Sha256;
    const KDF_ID: u16 = 0x0001;
}

/// HKDF-SHA384.
pub struct HkdfSha384 {}
impl Kdf for HkdfSha384 {
    type HashImpl = sha2::Sha384;
    const KDF_ID: u16 = 0x0002;
}

/// HKDF-SHA512.
pub struct HkdfSha512 {}
impl Kdf for HkdfSha512 {
    type HashImpl = sha2::Sha512;
    const KDF_ID: u16 = 0x0003;
}

const HPKE_VERSION_ID: &[u8] = b"HPKE-v1";

/// The byte-length of a KDF's output, as a type-level constant usable to size
/// a `GenericArray` generically over `Kdf`.
pub(crate) type KdfOutputSize<Kdf> = <<Kdf as self::Kdf>::HashImpl as digest::OutputSizeUser>::OutputSize;

// def LabeledExtract(salt, label, ikm):
//   labeled_ikm = concat("HPKE-v1", suite_id, label, ikm)
//   return Extract(salt, labeled_ikm)
/// Runs `LabeledExtract`, returning both the raw extracted PRK bytes and an
/// `Hkdf` context primed with that PRK, ready for `LabeledExpand` calls.
pub(crate) fn labeled_extract<Kdf: self::Kdf>(
    salt: &[u8],
    suite_id: &[u8],
    label: &[u8],
    ikm: &[u8],
) -> (
    GenericArray<u8, <Kdf::HashImpl as digest::OutputSizeUser>::OutputSize>,
    Hkdf<Kdf::HashImpl>,
) {
    labeled_extract_multi::<Kdf>(salt, suite_id, label, &[ikm])
}

/// Like [`labeled_extract`], but accumulates `ikm` from several disjoint
/// slices instead of one contiguous one. DHKEM's `AuthEncap`/`AuthDecap` need
/// this to extract over `dh || dh_auth` without concatenating them into a
/// fresh buffer first.
pub(crate) fn labeled_extract_multi<Kdf: self::Kdf>(
    salt: &[u8],
    suite_id: &[u8],
    label: &[u8],
    ikm_parts: &[&[u8]],
) -> (
    GenericArray<u8, <Kdf::HashImpl as digest::OutputSizeUser>::OutputSize>,
    Hkdf<Kdf::HashImpl>,
) {
    let mut extract_ctx = HkdfExtract::<Kdf::HashImpl>::new(Some(salt));
    extract_ctx.input_ikm(HPKE_VERSION_ID);
    extract_ctx.input_ikm(suite_id);
    extract_ctx.input_ikm(label);
    for part in ikm_parts {
        extract_ctx.input_ikm(part);
    }
    let (prk, hkdf_ctx) = extract_ctx.finalize();
    (prk, hkdf_ctx)
}

/// `LabeledExpand`, implemented on top of an already-extracted `Hkdf`
/// context.
pub(crate) trait LabeledExpand {
    fn labeled_expand(
        &self,
        suite_id: &[u8],
        label: &[u8],
        info: &[u8],
        out_buf: &mut [u8],
    ) -> Result<(), hkdf::InvalidLength> {
        self.labeled_expand_multi(suite_id, label, &[info], out_buf)
    }

    /// Like `labeled_expand`, but `info` is given as several disjoint slices
    /// (e.g. DHKEM's `kem_context = enc || pkR || pkS`) instead of one
    /// contiguous one.
    fn labeled_expand_multi(
        &self,
        suite_id: &[u8],
        label: &[u8],
        info_parts: &[&[u8]],
        out_buf: &mut [u8],
    ) -> Result<(), hkdf::InvalidLength>;
}

impl<H: Digest + digest::OutputSizeUser> LabeledExpand for Hkdf<H> {
    // def LabeledExpand(prk, label, info, L):
    //   labeled_info = concat(I2OSP(L, 2), "HPKE-v1", suite_id, label, info)
    //   return Expand(prk, labeled_info, L)
    fn labeled_expand_multi(
        &self,
        suite_id: &[u8],
        label: &[u8],
        info_parts: &[&[u8]],
        out_buf: &mut [u8],
    ) -> Result<(), hkdf::InvalidLength> {
        let out_len = out_buf.len() as u16;
        let len_bytes = out_len.to_be_bytes();

        // MAX_DIGEST_SIZE bounds `suite_id` (10 bytes max) and `label`
        // (at most a handful of ASCII bytes); `info` is arbitrary length and
        // handled separately via hkdf's multi-part `expand_multi_info`.
        let (prefix_buf, prefix_len) = concat_with_known_maxlen!(
            2 + HPKE_VERSION_ID.len() + MAX_DIGEST_SIZE,
            &len_bytes,
            HPKE_VERSION_ID,
            suite_id,
            label,
        );

        // `kem_context` never has more than 3 parts (enc, pkR, pkS); 1 slot
        // for the label prefix makes 4.
        const MAX_PARTS: usize = 4;
        assert!(
            info_parts.len() <= MAX_PARTS - 1,
            "labeled_expand_multi: too many info parts"
        );
        let mut all_parts: [&[u8]; MAX_PARTS] = [&[]; MAX_PARTS];
        all_parts[0] = &prefix_buf[..prefix_len];
        for (slot, part) in all_parts[1..].iter_mut().zip(info_parts.iter()) {
            *slot = part;
        }

        self.expand_multi_info(&all_parts[..info_parts.len() + 1], out_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::{labeled_extract, HkdfSha256, LabeledExpand};

    #[test]
    fn test_labeled_expand_respects_length() {
        let suite_id = b"HPKEtest";
        let (_, hkdf_ctx) = labeled_extract::<HkdfSha256>(&[], suite_id, b"secret", b"ikm");

        let mut short = [0u8; 16];
        let mut long = [0u8; 32];
        hkdf_ctx
            .labeled_expand(suite_id, b"key", b"", &mut short)
            .unwrap();
        hkdf_ctx
            .labeled_expand(suite_id, b"key", b"", &mut long)
            .unwrap();

        // Differently-sized outputs from the same label must not be simple
        // truncations of each other.
        assert_ne!(&long[..16], &short[..]);
    }

    #[test]
    fn test_labeled_expand_binds_label() {
        let suite_id = b"HPKEtest";
        let (_, hkdf_ctx) = labeled_extract::<HkdfSha256>(&[], suite_id, b"secret", b"ikm");

        let mut key = [0u8; 16];
        let mut nonce = [0u8; 16];
        hkdf_ctx.labeled_expand(suite_id, b"key", b"", &mut key).unwrap();
        hkdf_ctx
            .labeled_expand(suite_id, b"nonce", b"", &mut nonce)
            .unwrap();

        assert_ne!(key, nonce);
    }
}
