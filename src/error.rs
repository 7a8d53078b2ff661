use core::fmt;

/// The error type returned by every fallible operation in this crate.
///
/// This is a plain enum rather than an opaque/boxed error: almost every
/// variant is reachable from `no_std` code with no allocator, so there is
/// nowhere to put a heap-allocated cause chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum HpkeError {
    /// `AssembleCipherSuite` was given a `(KEMID, KDFID, AEADID)` triple this
    /// crate does not implement.
    UnknownSuite,
    /// The requested HPKE mode is not supported by this build (e.g. PSK
    /// inputs supplied without the `Psk`/`AuthPsk` mode, or vice versa).
    ModeNotSupported,
    /// `psk`/`psk_id` were supplied inconsistently with the mode in use: both
    /// must be present for `Psk`/`AuthPsk` modes and both absent otherwise.
    InconsistentPsk,
    /// A public key, private key, or other fixed-size encoding failed to
    /// decode: wrong length, or (for keys) a point not on the curve / an
    /// identity element.
    InvalidEncoding,
    /// A Diffie-Hellman computation produced the all-zero output forbidden
    /// by RFC 9180 §7.1.4, or otherwise failed key validation, on the
    /// `Encap`/`AuthEncap` (sender) side.
    InvalidKeyExchange,
    /// `Decap`/`AuthDecap` failed structurally: the encapsulated key
    /// deserialized fine, but the resulting Diffie-Hellman computation
    /// produced the all-zero output RFC 9180 §7.1.4 forbids. Distinct from
    /// `InvalidEncoding`, which covers a malformed `enc` that never reached
    /// the DH step at all.
    InvalidCiphertext,
    /// AEAD open failed: the tag did not verify, or the ciphertext plus
    /// associated data was tampered with.
    AuthenticationFailure,
    /// The per-context sequence number would overflow on the next `seal` or
    /// `open`; the context must not be used again.
    MessageLimitReached,
    /// The operation is not implemented for this ciphersuite (e.g. `seal`/
    /// `open` on an export-only AEAD).
    OperationNotSupported,
    /// `Unmarshal` was given bytes that do not decode to a valid context:
    /// wrong length, unknown suite IDs, or an invalid sequence number field.
    MalformedSerialization,
}

impl fmt::Display for HpkeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            HpkeError::UnknownSuite => "unknown or unsupported ciphersuite identifiers",
            HpkeError::ModeNotSupported => "HPKE mode not supported in this configuration",
            HpkeError::InconsistentPsk => "psk and psk_id must be supplied together, and only for PSK modes",
            HpkeError::InvalidEncoding => "invalid fixed-size encoding (wrong length or invalid curve point)",
            HpkeError::InvalidKeyExchange => "Diffie-Hellman computation produced an invalid shared secret",
            HpkeError::InvalidCiphertext => "KEM decapsulation failed: invalid ciphertext",
            HpkeError::AuthenticationFailure => "AEAD authentication failed",
            HpkeError::MessageLimitReached => "sequence number would overflow; context is exhausted",
            HpkeError::OperationNotSupported => "operation not supported for this ciphersuite",
            HpkeError::MalformedSerialization => "malformed context serialization",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HpkeError {}
