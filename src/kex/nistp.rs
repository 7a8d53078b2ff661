//! ECDH over the NIST prime curves, generalized across P-256 and P-521 with
//! one macro instead of two near-identical hand-written impls (the teacher's
//! own P-256-only module predates the `elliptic_curve` crate's unified
//! `ecdh`/`sec1` surface and duplicates this logic by hand per curve).

use crate::{
    kdf::{labeled_extract, Kdf as KdfTrait, LabeledExpand},
    kex::{Deserializable, KeyExchange, Serializable},
    util::KemSuiteId,
    HpkeError,
};

use generic_array::GenericArray;
use subtle::ConstantTimeEq;

macro_rules! impl_nistp_kex {
    (
        mod_name = $mod_name:ident,
        krate = $krate:ident,
        kex_name = $kex_name:ident,
        npk = $npk:ty,
        nsk = $nsk:ty,
        ndh = $ndh:ty,
        bitmask = $bitmask:expr,
    ) => {
        pub mod $mod_name {
            use super::*;
            use $krate::{
                elliptic_curve::{
                    ecdh::diffie_hellman,
                    sec1::{FromEncodedPoint, ToEncodedPoint},
                },
                EncodedPoint, PublicKey as CurvePublicKey, SecretKey,
            };

            /// An uncompressed public key.
            #[derive(Clone)]
            pub struct PublicKey(CurvePublicKey);

            /// A private scalar in `[1, order)`.
            #[derive(Clone)]
            pub struct PrivateKey(SecretKey);

            /// A bare DH computation result (the shared x-coordinate).
            pub struct KexResult(GenericArray<u8, $ndh>);

            impl Serializable for PublicKey {
                type OutputSize = $npk;

                fn to_bytes(&self) -> GenericArray<u8, Self::OutputSize> {
                    GenericArray::clone_from_slice(self.0.to_encoded_point(false).as_bytes())
                }
            }

            impl Deserializable for PublicKey {
                fn from_bytes(encoded: &[u8]) -> Result<Self, HpkeError> {
                    if encoded.len() != Self::size() {
                        return Err(HpkeError::InvalidEncoding);
                    }
                    let ep =
                        EncodedPoint::from_bytes(encoded).map_err(|_| HpkeError::InvalidEncoding)?;
                    let pk = CurvePublicKey::from_encoded_point(&ep);
                    if bool::from(pk.is_some()) {
                        Ok(PublicKey(pk.unwrap()))
                    } else {
                        Err(HpkeError::InvalidEncoding)
                    }
                }
            }

            impl Serializable for PrivateKey {
                type OutputSize = $nsk;

                fn to_bytes(&self) -> GenericArray<u8, Self::OutputSize> {
                    self.0.to_bytes()
                }
            }

            impl Deserializable for PrivateKey {
                fn from_bytes(encoded: &[u8]) -> Result<Self, HpkeError> {
                    // `SecretKey::from_bytes` already rejects zero and
                    // out-of-range scalars, which is exactly what RFC 9180's
                    // private-key validity check requires.
                    SecretKey::from_bytes(encoded.into())
                        .map(PrivateKey)
                        .map_err(|_| HpkeError::InvalidEncoding)
                }
            }

            impl Serializable for KexResult {
                type OutputSize = $ndh;

                // §4.1: the KEX result representation is the serialized
                // x-coordinate of the shared point.
                fn to_bytes(&self) -> GenericArray<u8, Self::OutputSize> {
                    self.0.clone()
                }
            }

            /// ECDH over this NIST curve.
            pub struct $kex_name {}

            impl KeyExchange for $kex_name {
                #[doc(hidden)]
                type PublicKey = PublicKey;
                #[doc(hidden)]
                type PrivateKey = PrivateKey;
                #[doc(hidden)]
                type KexResult = KexResult;

                #[doc(hidden)]
                fn sk_to_pk(sk: &PrivateKey) -> PublicKey {
                    PublicKey(sk.0.public_key())
                }

                /// Returns `HpkeError::InvalidKeyExchange` if and only if the
                /// DH result is the all-zero value, as RFC 9180 §7.1.4
                /// requires.
                #[doc(hidden)]
                fn kex(sk: &PrivateKey, pk: &PublicKey) -> Result<KexResult, HpkeError> {
                    let shared = diffie_hellman(sk.0.to_nonzero_scalar(), pk.0.as_affine());
                    let bytes: GenericArray<u8, $ndh> =
                        GenericArray::clone_from_slice(shared.raw_secret_bytes());
                    if bytes.ct_eq(&GenericArray::<u8, $ndh>::default()).into() {
                        Err(HpkeError::InvalidKeyExchange)
                    } else {
                        Ok(KexResult(bytes))
                    }
                }

                // def DeriveKeyPair(ikm):
                //   dkp_prk = LabeledExtract(zero(0), "dkp_prk", ikm)
                //   sk = 0
                //   counter = 0
                //   while sk == 0 or sk >= order:
                //     bytes = LabeledExpand(dkp_prk, "candidate", I2OSP(counter, 1), Nsk)
                //     bytes[0] &= bitmask
                //     sk = OS2IP(bytes)
                //     counter += 1
                //   return (sk, pk(sk))
                #[doc(hidden)]
                fn derive_keypair<Kdf: KdfTrait>(
                    suite_id: &KemSuiteId,
                    ikm: &[u8],
                ) -> (PrivateKey, PublicKey) {
                    let (_, hkdf_ctx) = labeled_extract::<Kdf>(&[], suite_id, b"dkp_prk", ikm);
                    let mut buf = GenericArray::<u8, $nsk>::default();

                    for counter in 0u8..=255 {
                        hkdf_ctx
                            .labeled_expand(suite_id, b"candidate", &[counter], &mut buf)
                            .expect("Nsk is always within an HKDF's hashable range");
                        buf[0] &= $bitmask;

                        if let Ok(sk) = SecretKey::from_bytes(&buf) {
                            let pk = sk.public_key();
                            return (PrivateKey(sk), PublicKey(pk));
                        }
                    }

                    // The probability of exhausting 256 candidates is
                    // astronomically small for either curve.
                    panic!("DeriveKeyPair failed all attempts");
                }
            }
        }
    };
}

#[cfg(feature = "p256")]
impl_nistp_kex! {
    mod_name = p256_kex,
    krate = p256,
    kex_name = DhP256,
    npk = generic_array::typenum::U65,
    nsk = generic_array::typenum::U32,
    ndh = generic_array::typenum::U32,
    bitmask = 0xffu8,
}

#[cfg(feature = "p521")]
impl_nistp_kex! {
    mod_name = p521_kex,
    krate = p521,
    kex_name = DhP521,
    npk = generic_array::typenum::U133,
    nsk = generic_array::typenum::U66,
    ndh = generic_array::typenum::U66,
    bitmask = 0x01u8,
}

#[cfg(feature = "p256")]
pub use p256_kex::DhP256;
#[cfg(feature = "p521")]
pub use p521_kex::DhP521;
