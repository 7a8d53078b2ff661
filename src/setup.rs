//! The HPKE key schedule (RFC 9180 §5.1) and the eight `Setup*` entry points
//! built on top of it (§5.1.1-§5.1.4).

use crate::{
    aead::{Aead, AeadKey, AeadNonce},
    context::{Context, ContextParams, ExporterSecret, SetupParams, MAX_KEY_SCHEDULE_CONTEXT_LEN},
    kdf::{labeled_extract, Kdf as KdfTrait, LabeledExpand, MAX_DIGEST_SIZE},
    kem::{dhkem, EncappedKey, Kem as KemTrait, SharedSecret},
    kex::KeyExchange,
    op_mode::{OpMode, OpModeR, OpModeS, PskBundle},
    util::{concat_with_known_maxlen, full_suite_id},
    HpkeError, ReceiverContext, SenderContext,
};

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// `VerifyPSKInputs`: exactly one of `{Base,Auth}` with no PSK, or
/// `{PSK,AuthPSK}` with both `psk` and `psk_id` present, is valid.
fn verify_psk_inputs<Kex: KeyExchange, M: OpMode<Kex>>(mode: &M) -> Result<(), HpkeError> {
    let has_psk = !mode.get_psk_bytes().is_empty();
    let has_psk_id = !mode.get_psk_id().is_empty();

    match (mode.mode_id(), has_psk, has_psk_id) {
        (0x00 | 0x02, false, false) => Ok(()),
        (0x01 | 0x03, true, true) => Ok(()),
        _ => Err(HpkeError::InconsistentPsk),
    }
}

// def KeySchedule(mode, shared_secret, info, psk, psk_id):
//   VerifyPSKInputs(mode, psk, psk_id)
//   psk_id_hash = LabeledExtract("", "psk_id_hash", psk_id)
//   info_hash = LabeledExtract("", "info_hash", info)
//   key_schedule_context = concat(mode, psk_id_hash, info_hash)
//   secret = LabeledExtract(shared_secret, "secret", psk)
//   key = LabeledExpand(secret, "key", key_schedule_context, Nk)
//   base_nonce = LabeledExpand(secret, "base_nonce", key_schedule_context, Nn)
//   exporter_secret = LabeledExpand(secret, "exp", key_schedule_context, Nh)
//   return Context(key, base_nonce, 0, exporter_secret)
fn key_schedule<A: Aead, Kdf: KdfTrait, Kem: KemTrait, M: OpMode<Kem::Kex>>(
    mode: &M,
    shared_secret: &SharedSecret<Kem>,
    info: &[u8],
    enc: &EncappedKey<Kem>,
) -> Result<Context<A, Kdf, Kem>, HpkeError> {
    verify_psk_inputs(mode)?;

    let suite_id = full_suite_id::<A, Kdf, Kem>();

    let (psk_id_hash, _) = labeled_extract::<Kdf>(&[], &suite_id, b"psk_id_hash", mode.get_psk_id());
    let (info_hash, _) = labeled_extract::<Kdf>(&[], &suite_id, b"info_hash", info);

    let (ksc_buf, ksc_len) = concat_with_known_maxlen!(
        MAX_KEY_SCHEDULE_CONTEXT_LEN,
        &[mode.mode_id()],
        psk_id_hash.as_slice(),
        info_hash.as_slice(),
    );
    let key_schedule_context = &ksc_buf[..ksc_len];

    let (secret, secret_hkdf) =
        labeled_extract::<Kdf>(shared_secret.as_slice(), &suite_id, b"secret", mode.get_psk_bytes());

    let mut key = AeadKey::<A>::default();
    secret_hkdf
        .labeled_expand(&suite_id, b"key", key_schedule_context, &mut key)
        .expect("Nk is always within an HKDF's hashable range");
    let mut base_nonce = AeadNonce::<A>::default();
    secret_hkdf
        .labeled_expand(&suite_id, b"base_nonce", key_schedule_context, &mut base_nonce)
        .expect("Nn is always within an HKDF's hashable range");
    let mut exporter_secret = ExporterSecret::<Kdf>::default();
    secret_hkdf
        .labeled_expand(&suite_id, b"exp", key_schedule_context, &mut exporter_secret)
        .expect("Nh is always within an HKDF's hashable range");

    let mut secret_buf = [0u8; MAX_DIGEST_SIZE];
    secret_buf[..secret.len()].copy_from_slice(&secret);

    let setup_params = SetupParams {
        psk_id_hash,
        info_hash,
        enc: enc.clone(),
    };
    let context_params = ContextParams {
        key_schedule_context: (ksc_buf, ksc_len),
        secret: (secret_buf, secret.len()),
    };

    Ok(Context::new(key, base_nonce, exporter_secret, setup_params, context_params))
}

// def SetupAuthPSKS(pkR, info, psk, psk_id, skS):
//   shared_secret, enc = AuthEncap(pkR, skS)
//   return enc, KeySchedule(mode_auth_psk, shared_secret, info, psk, psk_id)
/// Creates an HPKE encryption context addressed to `pk_recip`. Returns the
/// encapsulated key to send alongside every ciphertext, plus the sender's
/// half of the context.
pub fn setup_sender<A, Kdf, Kem, R>(
    mode: &OpModeS<Kem::Kex>,
    pk_recip: &<Kem::Kex as KeyExchange>::PublicKey,
    info: &[u8],
    csprng: &mut R,
) -> Result<(EncappedKey<Kem>, SenderContext<A, Kdf, Kem>), HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
    R: CryptoRng + RngCore,
{
    let sender_id_keypair = mode.get_sender_id_keypair().map(|(sk, pk)| (sk, pk));
    if sender_id_keypair.is_some() && !Kem::SUPPORTS_AUTH {
        return Err(HpkeError::ModeNotSupported);
    }

    let (mut shared_secret, enc) = dhkem::encap::<Kem, R>(pk_recip, sender_id_keypair, csprng)?;
    let ctx = key_schedule::<A, Kdf, Kem, _>(mode, &shared_secret, info, &enc);
    shared_secret.as_mut_slice().zeroize();

    Ok((enc, SenderContext::from(ctx?)))
}

// def SetupAuthPSKR(enc, skR, info, psk, psk_id, pkS):
//   shared_secret = AuthDecap(enc, skR, pkS)
//   return KeySchedule(mode_auth_psk, shared_secret, info, psk, psk_id)
/// Recovers an HPKE decryption context from `enc`, the encapsulated key the
/// sender produced.
pub fn setup_receiver<A, Kdf, Kem>(
    mode: &OpModeR<Kem::Kex>,
    sk_recip: &<Kem::Kex as KeyExchange>::PrivateKey,
    enc: &EncappedKey<Kem>,
    info: &[u8],
) -> Result<ReceiverContext<A, Kdf, Kem>, HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
{
    let pk_sender_id = mode.get_pk_sender_id();
    if pk_sender_id.is_some() && !Kem::SUPPORTS_AUTH {
        return Err(HpkeError::ModeNotSupported);
    }

    let mut shared_secret = dhkem::decap::<Kem>(sk_recip, pk_sender_id, enc)?;
    let ctx = key_schedule::<A, Kdf, Kem, _>(mode, &shared_secret, info, enc);
    shared_secret.as_mut_slice().zeroize();

    Ok(ReceiverContext::from(ctx?))
}

/// `SetupBaseS`: no sender authentication.
pub fn setup_base_s<A, Kdf, Kem, R>(
    pk_recip: &<Kem::Kex as KeyExchange>::PublicKey,
    info: &[u8],
    csprng: &mut R,
) -> Result<(EncappedKey<Kem>, SenderContext<A, Kdf, Kem>), HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
    R: CryptoRng + RngCore,
{
    setup_sender::<A, Kdf, Kem, R>(&OpModeS::Base, pk_recip, info, csprng)
}

/// `SetupBaseR`: no sender authentication.
pub fn setup_base_r<A, Kdf, Kem>(
    sk_recip: &<Kem::Kex as KeyExchange>::PrivateKey,
    enc: &EncappedKey<Kem>,
    info: &[u8],
) -> Result<ReceiverContext<A, Kdf, Kem>, HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
{
    setup_receiver::<A, Kdf, Kem>(&OpModeR::Base, sk_recip, enc, info)
}

/// `SetupPSKS`: sender authenticated by a preshared key.
pub fn setup_psk_s<'a, A, Kdf, Kem, R>(
    pk_recip: &<Kem::Kex as KeyExchange>::PublicKey,
    info: &[u8],
    psk: &'a [u8],
    psk_id: &'a [u8],
    csprng: &mut R,
) -> Result<(EncappedKey<Kem>, SenderContext<A, Kdf, Kem>), HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
    R: CryptoRng + RngCore,
{
    let mode = OpModeS::Psk(PskBundle { psk, psk_id });
    setup_sender::<A, Kdf, Kem, R>(&mode, pk_recip, info, csprng)
}

/// `SetupPSKR`: sender authenticated by a preshared key.
pub fn setup_psk_r<'a, A, Kdf, Kem>(
    sk_recip: &<Kem::Kex as KeyExchange>::PrivateKey,
    enc: &EncappedKey<Kem>,
    info: &[u8],
    psk: &'a [u8],
    psk_id: &'a [u8],
) -> Result<ReceiverContext<A, Kdf, Kem>, HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
{
    let mode = OpModeR::Psk(PskBundle { psk, psk_id });
    setup_receiver::<A, Kdf, Kem>(&mode, sk_recip, enc, info)
}

/// `SetupAuthS`: sender authenticated by a long-term identity keypair.
/// Requires a [`kem::Kem`] with `SUPPORTS_AUTH`; otherwise fails with
/// [`HpkeError::ModeNotSupported`].
pub fn setup_auth_s<A, Kdf, Kem, R>(
    pk_recip: &<Kem::Kex as KeyExchange>::PublicKey,
    info: &[u8],
    sk_sender_id: <Kem::Kex as KeyExchange>::PrivateKey,
    pk_sender_id: <Kem::Kex as KeyExchange>::PublicKey,
    csprng: &mut R,
) -> Result<(EncappedKey<Kem>, SenderContext<A, Kdf, Kem>), HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
    R: CryptoRng + RngCore,
{
    let mode = OpModeS::Auth((sk_sender_id, pk_sender_id));
    setup_sender::<A, Kdf, Kem, R>(&mode, pk_recip, info, csprng)
}

/// `SetupAuthR`: sender authenticated by a long-term identity keypair.
pub fn setup_auth_r<A, Kdf, Kem>(
    sk_recip: &<Kem::Kex as KeyExchange>::PrivateKey,
    enc: &EncappedKey<Kem>,
    info: &[u8],
    pk_sender_id: <Kem::Kex as KeyExchange>::PublicKey,
) -> Result<ReceiverContext<A, Kdf, Kem>, HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
{
    let mode = OpModeR::Auth(pk_sender_id);
    setup_receiver::<A, Kdf, Kem>(&mode, sk_recip, enc, info)
}

/// `SetupAuthPSKS`: sender authenticated by both a PSK and a long-term
/// identity keypair.
pub fn setup_auth_psk_s<'a, A, Kdf, Kem, R>(
    pk_recip: &<Kem::Kex as KeyExchange>::PublicKey,
    info: &[u8],
    sk_sender_id: <Kem::Kex as KeyExchange>::PrivateKey,
    pk_sender_id: <Kem::Kex as KeyExchange>::PublicKey,
    psk: &'a [u8],
    psk_id: &'a [u8],
    csprng: &mut R,
) -> Result<(EncappedKey<Kem>, SenderContext<A, Kdf, Kem>), HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
    R: CryptoRng + RngCore,
{
    let mode = OpModeS::AuthPsk((sk_sender_id, pk_sender_id), PskBundle { psk, psk_id });
    setup_sender::<A, Kdf, Kem, R>(&mode, pk_recip, info, csprng)
}

/// `SetupAuthPSKR`: sender authenticated by both a PSK and a long-term
/// identity keypair.
pub fn setup_auth_psk_r<'a, A, Kdf, Kem>(
    sk_recip: &<Kem::Kex as KeyExchange>::PrivateKey,
    enc: &EncappedKey<Kem>,
    info: &[u8],
    pk_sender_id: <Kem::Kex as KeyExchange>::PublicKey,
    psk: &'a [u8],
    psk_id: &'a [u8],
) -> Result<ReceiverContext<A, Kdf, Kem>, HpkeError>
where
    A: Aead,
    Kdf: KdfTrait,
    Kem: KemTrait,
{
    let mode = OpModeR::AuthPsk(pk_sender_id, PskBundle { psk, psk_id });
    setup_receiver::<A, Kdf, Kem>(&mode, sk_recip, enc, info)
}

#[cfg(test)]
mod tests {
    use super::{setup_receiver, setup_sender};
    use crate::{
        aead::ChaCha20Poly1305,
        kdf::HkdfSha256,
        kem::Kem as KemTrait,
        test_util::{ctx_agrees, gen_rand_buf, new_op_mode_pair, OpModeKind},
        HpkeError,
    };

    use rand::{rngs::StdRng, SeedableRng};

    /// `setup_sender` and `setup_receiver`, run with mutually agreeing
    /// inputs, must derive the same context, in every op mode.
    macro_rules! test_setup_correctness {
        ($test_name:ident, $aead_ty:ty, $kdf_ty:ty, $kem_ty:ty) => {
            #[test]
            fn $test_name() {
                type A = $aead_ty;
                type Kdf = $kdf_ty;
                type Kem = $kem_ty;
                type Kex = <Kem as KemTrait>::Kex;

                let mut csprng = StdRng::from_entropy();
                let info = b"setup correctness test info string";

                let (sk_recip, pk_recip) = Kem::gen_keypair(&mut csprng);

                for op_mode_kind in &[
                    OpModeKind::Base,
                    OpModeKind::Auth,
                    OpModeKind::Psk,
                    OpModeKind::AuthPsk,
                ] {
                    let (psk, psk_id) = (gen_rand_buf(), gen_rand_buf());
                    let (sender_mode, receiver_mode) =
                        new_op_mode_pair::<Kex>(*op_mode_kind, &psk, &psk_id);

                    let (encapped_key, mut sender_ctx) =
                        setup_sender::<A, Kdf, Kem, _>(&sender_mode, &pk_recip, &info[..], &mut csprng)
                            .unwrap();
                    let mut receiver_ctx =
                        setup_receiver::<A, Kdf, Kem>(&receiver_mode, &sk_recip, &encapped_key, &info[..])
                            .unwrap();

                    assert!(ctx_agrees(&mut sender_ctx, &mut receiver_ctx));
                }
            }
        };
    }

    /// Any single changed input (info, receiver key, or encapped key) must
    /// produce a receiver context that disagrees with the sender.
    macro_rules! test_setup_soundness {
        ($test_name:ident, $aead_ty:ty, $kdf_ty:ty, $kem_ty:ty) => {
            #[test]
            fn $test_name() {
                type A = $aead_ty;
                type Kdf = $kdf_ty;
                type Kem = $kem_ty;
                type Kex = <Kem as KemTrait>::Kex;

                let mut csprng = StdRng::from_entropy();
                let info = b"setup soundness test info string";

                let (sk_recip, pk_recip) = Kem::gen_keypair(&mut csprng);
                let (psk, psk_id) = (gen_rand_buf(), gen_rand_buf());
                let (sender_mode, receiver_mode) =
                    new_op_mode_pair::<Kex>(OpModeKind::Base, &psk, &psk_id);

                let (encapped_key, mut sender_ctx) =
                    setup_sender::<A, Kdf, Kem, _>(&sender_mode, &pk_recip, &info[..], &mut csprng)
                        .unwrap();

                let bad_info = b"an entirely different info string";
                let mut wrong_info_ctx =
                    setup_receiver::<A, Kdf, Kem>(&receiver_mode, &sk_recip, &encapped_key, &bad_info[..])
                        .unwrap();
                assert!(!ctx_agrees(&mut sender_ctx, &mut wrong_info_ctx));

                let (bad_sk, _) = Kem::gen_keypair(&mut csprng);
                let mut wrong_key_ctx =
                    setup_receiver::<A, Kdf, Kem>(&receiver_mode, &bad_sk, &encapped_key, &info[..])
                        .unwrap();
                assert!(!ctx_agrees(&mut sender_ctx, &mut wrong_key_ctx));

                let (bad_encapped_key, _) =
                    setup_sender::<A, Kdf, Kem, _>(&sender_mode, &pk_recip, &info[..], &mut csprng)
                        .unwrap();
                let mut wrong_enc_ctx = setup_receiver::<A, Kdf, Kem>(
                    &receiver_mode,
                    &sk_recip,
                    &bad_encapped_key,
                    &info[..],
                )
                .unwrap();
                assert!(!ctx_agrees(&mut sender_ctx, &mut wrong_enc_ctx));

                let mut good_ctx =
                    setup_receiver::<A, Kdf, Kem>(&receiver_mode, &sk_recip, &encapped_key, &info[..])
                        .unwrap();
                assert!(ctx_agrees(&mut sender_ctx, &mut good_ctx));
            }
        };
    }

    #[cfg(feature = "x25519")]
    test_setup_correctness!(
        test_setup_correctness_x25519,
        ChaCha20Poly1305,
        HkdfSha256,
        crate::kem::X25519HkdfSha256
    );
    #[cfg(feature = "p256")]
    test_setup_correctness!(
        test_setup_correctness_p256,
        ChaCha20Poly1305,
        HkdfSha256,
        crate::kem::DhP256HkdfSha256
    );

    #[cfg(feature = "x25519")]
    test_setup_soundness!(
        test_setup_soundness_x25519,
        ChaCha20Poly1305,
        HkdfSha256,
        crate::kem::X25519HkdfSha256
    );
    #[cfg(feature = "p256")]
    test_setup_soundness!(
        test_setup_soundness_p256,
        ChaCha20Poly1305,
        HkdfSha256,
        crate::kem::DhP256HkdfSha256
    );

    /// §8, scenario 3: PSK mode with an empty PSK fails `InconsistentPsk`;
    /// a well-formed, non-empty PSK round-trips normally.
    #[test]
    fn test_psk_mode_requires_nonempty_psk() {
        use crate::{kem::X25519HkdfSha256, kex::x25519::X25519, op_mode::PskBundle};

        type A = ChaCha20Poly1305;
        type Kdf = HkdfSha256;
        type Kem = X25519HkdfSha256;

        let mut csprng = StdRng::from_entropy();
        let (_, pk_recip) = Kem::gen_keypair(&mut csprng);
        let info = b"";

        let psk = [0u8; 32];
        let psk_id = b"Ennyn Durin aran Moria";
        let mode = crate::op_mode::OpModeS::<X25519>::Psk(PskBundle { psk: &psk, psk_id });
        assert!(setup_sender::<A, Kdf, Kem, _>(&mode, &pk_recip, info, &mut csprng).is_ok());

        let empty_psk_mode = crate::op_mode::OpModeS::<X25519>::Psk(PskBundle { psk: &[], psk_id });
        let err = setup_sender::<A, Kdf, Kem, _>(&empty_psk_mode, &pk_recip, info, &mut csprng).unwrap_err();
        assert_eq!(err, HpkeError::InconsistentPsk);
    }
}
