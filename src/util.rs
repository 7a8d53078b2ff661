//! Small byte-buffer helpers shared across the key schedule, the KEM, and the
//! labeled KDF wrappers. None of this allocates: every caller knows its
//! maximum output length at compile time, so we write into fixed-size stack
//! buffers instead.

use crate::{aead::Aead, kdf::Kdf as KdfTrait, kem::Kem as KemTrait};

/// `"HPKE" || KEMID || KDFID || AEADID`, the domain separator mixed into
/// every `LabeledExtract`/`LabeledExpand` call in the key schedule.
pub(crate) type FullSuiteId = [u8; 10];

/// `"KEM" || KEMID`, the domain separator DHKEM uses for its own internal
/// `LabeledExtract`/`LabeledExpand` calls (distinct from the full suite ID,
/// per RFC 9180 §4.1).
pub(crate) type KemSuiteId = [u8; 5];

pub(crate) fn full_suite_id<A: Aead, Kdf: KdfTrait, Kem: KemTrait>() -> FullSuiteId {
    let mut id = [0u8; 10];
    id[0..4].copy_from_slice(b"HPKE");
    id[4..6].copy_from_slice(&Kem::KEM_ID.to_be_bytes());
    id[6..8].copy_from_slice(&Kdf::KDF_ID.to_be_bytes());
    id[8..10].copy_from_slice(&A::AEAD_ID.to_be_bytes());
    id
}

pub(crate) fn kem_suite_id<Kem: KemTrait>() -> KemSuiteId {
    let mut id = [0u8; 5];
    id[0..3].copy_from_slice(b"KEM");
    id[3..5].copy_from_slice(&Kem::KEM_ID.to_be_bytes());
    id
}

/// Concatenates byte slices into a fixed-size buffer without allocating,
/// given a known maximum combined length. Expands to `(buf, len)`, where
/// `buf[..len]` holds the concatenation.
macro_rules! concat_with_known_maxlen {
    ($maxlen:expr, $($slice:expr),+ $(,)?) => {{
        let mut buf = [0u8; $maxlen];
        let mut len = 0usize;
        $(
            let piece: &[u8] = $slice;
            buf[len..len + piece.len()].copy_from_slice(piece);
            len += piece.len();
        )+
        (buf, len)
    }};
}

pub(crate) use concat_with_known_maxlen;
