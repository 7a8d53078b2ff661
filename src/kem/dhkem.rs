//! The generic DHKEM construction (RFC 9180 §4.1): `Encap`/`Decap` and their
//! `Auth` counterparts, built from any [`KeyExchange`] group plus a fixed
//! internal KDF. Every concrete KEM in [`super`] is one instantiation of
//! this module.

use crate::{
    kdf::{labeled_extract_multi, LabeledExpand},
    kem::{EncappedKey, Kem as KemTrait, SharedSecret},
    kex::{Deserializable, KeyExchange, Serializable},
    util::kem_suite_id,
    HpkeError,
};

use generic_array::GenericArray;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

type Sk<Kem> = <<Kem as KemTrait>::Kex as KeyExchange>::PrivateKey;
type Pk<Kem> = <<Kem as KemTrait>::Kex as KeyExchange>::PublicKey;

// def ExtractAndExpand(dh, kem_context):
//   eae_prk = LabeledExtract(zero(0), "eae_prk", dh)
//   shared_secret = LabeledExpand(eae_prk, "shared_secret", kem_context, Nsecret)
//   return shared_secret
fn extract_and_expand<Kem: KemTrait>(dh_parts: &[&[u8]], kem_context_parts: &[&[u8]]) -> SharedSecret<Kem> {
    let suite_id = kem_suite_id::<Kem>();
    let (_, hkdf_ctx) = labeled_extract_multi::<Kem::InternalKdf>(&[], &suite_id, b"eae_prk", dh_parts);

    let mut shared_secret = SharedSecret::<Kem>::default();
    hkdf_ctx
        .labeled_expand_multi(&suite_id, b"shared_secret", kem_context_parts, &mut shared_secret)
        .expect("Nsecret is always within an HKDF's hashable range");
    shared_secret
}

/// The deterministic core of `Encap`/`AuthEncap`: takes the ephemeral
/// keypair as an argument instead of sampling it, so test harnesses can
/// reproduce RFC 9180's test vectors, which fix the ephemeral key. Pass
/// `sender_id_keypair = Some(..)` to run `AuthEncap` instead of `Encap`.
pub(crate) fn encap_with_eph<Kem: KemTrait>(
    pk_recip: &Pk<Kem>,
    sender_id_keypair: Option<(&Sk<Kem>, &Pk<Kem>)>,
    sk_eph: Sk<Kem>,
) -> Result<(SharedSecret<Kem>, EncappedKey<Kem>), HpkeError> {
    let pk_eph = <Kem::Kex as KeyExchange>::sk_to_pk(&sk_eph);
    let enc = pk_eph;

    let mut dh = <Kem::Kex as KeyExchange>::kex(&sk_eph, pk_recip)?.to_bytes();
    let enc_bytes = enc.to_bytes();
    let pk_recip_bytes = pk_recip.to_bytes();

    let shared_secret = match sender_id_keypair {
        // def Encap(pkR):
        //   skE, pkE = GenerateKeyPair()
        //   dh = DH(skE, pkR)
        //   enc = SerializePublicKey(pkE)
        //   pkRm = SerializePublicKey(pkR)
        //   kem_context = concat(enc, pkRm)
        //   shared_secret = ExtractAndExpand(dh, kem_context)
        //   return shared_secret, enc
        None => extract_and_expand::<Kem>(&[&dh], &[&enc_bytes, &pk_recip_bytes]),
        // def AuthEncap(pkR, skS):
        //   skE, pkE = GenerateKeyPair()
        //   dh = concat(DH(skE, pkR), DH(skS, pkR))
        //   enc = SerializePublicKey(pkE)
        //   pkRm = SerializePublicKey(pkR)
        //   pkSm = SerializePublicKey(pk(skS))
        //   kem_context = concat(enc, pkRm, pkSm)
        //   shared_secret = ExtractAndExpand(dh, kem_context)
        //   return shared_secret, enc
        Some((sk_sender, pk_sender)) => {
            let mut dh_auth = <Kem::Kex as KeyExchange>::kex(sk_sender, pk_recip)?.to_bytes();
            let pk_sender_bytes = pk_sender.to_bytes();
            let out = extract_and_expand::<Kem>(
                &[&dh, &dh_auth],
                &[&enc_bytes, &pk_recip_bytes, &pk_sender_bytes],
            );
            dh_auth.zeroize();
            out
        }
    };

    dh.zeroize();
    Ok((shared_secret, enc))
}

/// `Encap`/`AuthEncap`: samples a fresh ephemeral keypair and runs
/// [`encap_with_eph`]. `sender_id_keypair = Some(..)` selects `AuthEncap`.
pub(crate) fn encap<Kem: KemTrait, R: CryptoRng + RngCore>(
    pk_recip: &Pk<Kem>,
    sender_id_keypair: Option<(&Sk<Kem>, &Pk<Kem>)>,
    csprng: &mut R,
) -> Result<(SharedSecret<Kem>, EncappedKey<Kem>), HpkeError> {
    let mut ikm = GenericArray::<u8, <Sk<Kem> as Serializable>::OutputSize>::default();
    csprng.fill_bytes(&mut ikm);
    let (sk_eph, _) = Kem::derive_keypair(&ikm);
    ikm.zeroize();

    encap_with_eph::<Kem>(pk_recip, sender_id_keypair, sk_eph)
}

/// `Decap`/`AuthDecap`: recovers the shared secret `Encap`/`AuthEncap`
/// produced, given the receiver's private key and the encapsulated key.
/// `pk_sender_id = Some(..)` selects `AuthDecap`.
pub(crate) fn decap<Kem: KemTrait>(
    sk_recip: &Sk<Kem>,
    pk_sender_id: Option<&Pk<Kem>>,
    encapped_key: &EncappedKey<Kem>,
) -> Result<SharedSecret<Kem>, HpkeError> {
    let pk_eph = encapped_key;

    let mut dh = <Kem::Kex as KeyExchange>::kex(sk_recip, pk_eph)
        .map_err(|_| HpkeError::InvalidCiphertext)?
        .to_bytes();
    let enc_bytes = pk_eph.to_bytes();
    let pk_recip = <Kem::Kex as KeyExchange>::sk_to_pk(sk_recip);
    let pk_recip_bytes = pk_recip.to_bytes();

    // def Decap(enc, skR):
    //   pkE = DeserializePublicKey(enc)
    //   dh = DH(skR, pkE)
    //   pkRm = SerializePublicKey(pk(skR))
    //   kem_context = concat(enc, pkRm)
    //   shared_secret = ExtractAndExpand(dh, kem_context)
    //   return shared_secret
    let shared_secret = match pk_sender_id {
        None => extract_and_expand::<Kem>(&[&dh], &[&enc_bytes, &pk_recip_bytes]),
        // def AuthDecap(enc, skR, pkS):
        //   pkE = DeserializePublicKey(enc)
        //   dh = concat(DH(skR, pkE), DH(skR, pkS))
        //   pkRm = SerializePublicKey(pk(skR))
        //   pkSm = SerializePublicKey(pkS)
        //   kem_context = concat(enc, pkRm, pkSm)
        //   shared_secret = ExtractAndExpand(dh, kem_context)
        //   return shared_secret
        Some(pk_sender) => {
            let mut dh_auth = <Kem::Kex as KeyExchange>::kex(sk_recip, pk_sender)
                .map_err(|_| HpkeError::InvalidCiphertext)?
                .to_bytes();
            let pk_sender_bytes = pk_sender.to_bytes();
            let out = extract_and_expand::<Kem>(
                &[&dh, &dh_auth],
                &[&enc_bytes, &pk_recip_bytes, &pk_sender_bytes],
            );
            dh_auth.zeroize();
            out
        }
    };

    dh.zeroize();
    Ok(shared_secret)
}

/// Parses an encapsulated key from its wire representation.
pub(crate) fn deserialize_encapped_key<Kem: KemTrait>(bytes: &[u8]) -> Result<EncappedKey<Kem>, HpkeError> {
    EncappedKey::<Kem>::from_bytes(bytes)
}
