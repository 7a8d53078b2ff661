//! ECDH over Curve448. The teacher's dependency set has no Curve448 support;
//! this module is new, shaped after [`crate::kex::x25519`] but against the
//! `x448` crate's API.

use crate::{
    kdf::{labeled_extract, Kdf as KdfTrait, LabeledExpand},
    kex::{Deserializable, KeyExchange, Serializable},
    util::KemSuiteId,
    HpkeError,
};

use generic_array::{typenum, GenericArray};
use subtle::ConstantTimeEq;

/// An X448 public key.
#[derive(Clone)]
pub struct PublicKey(x448::PublicKey);

/// An X448 private key.
#[derive(Clone)]
pub struct PrivateKey(x448::Secret);

/// A bare DH computation result.
pub struct KexResult(x448::SharedSecret);

impl Serializable for PublicKey {
    // §7.1: Npk of DHKEM(X448, HKDF-SHA512) is 56
    type OutputSize = typenum::U56;

    fn to_bytes(&self) -> GenericArray<u8, typenum::U56> {
        GenericArray::clone_from_slice(self.0.as_bytes())
    }
}

impl Deserializable for PublicKey {
    fn from_bytes(encoded: &[u8]) -> Result<Self, HpkeError> {
        if encoded.len() != Self::size() {
            return Err(HpkeError::InvalidEncoding);
        }
        let mut arr = [0u8; 56];
        arr.copy_from_slice(encoded);
        x448::PublicKey::from_bytes(&arr)
            .map(PublicKey)
            .ok_or(HpkeError::InvalidEncoding)
    }
}

impl Serializable for PrivateKey {
    // §7.1: Nsk of DHKEM(X448, HKDF-SHA512) is 56
    type OutputSize = typenum::U56;

    fn to_bytes(&self) -> GenericArray<u8, typenum::U56> {
        GenericArray::clone_from_slice(self.0.as_bytes())
    }
}

impl Deserializable for PrivateKey {
    fn from_bytes(encoded: &[u8]) -> Result<Self, HpkeError> {
        if encoded.len() != 56 {
            return Err(HpkeError::InvalidEncoding);
        }
        let mut arr = [0u8; 56];
        arr.copy_from_slice(encoded);
        x448::Secret::from_bytes(&arr)
            .map(PrivateKey)
            .ok_or(HpkeError::InvalidEncoding)
    }
}

impl Serializable for KexResult {
    // §4.1: Ndh of DHKEM(X448, HKDF-SHA512) is 56
    type OutputSize = typenum::U56;

    fn to_bytes(&self) -> GenericArray<u8, typenum::U56> {
        GenericArray::clone_from_slice(self.0.as_bytes())
    }
}

/// ECDH over the X448 group.
pub struct X448 {}

impl KeyExchange for X448 {
    #[doc(hidden)]
    type PublicKey = PublicKey;
    #[doc(hidden)]
    type PrivateKey = PrivateKey;
    #[doc(hidden)]
    type KexResult = KexResult;

    #[doc(hidden)]
    fn sk_to_pk(sk: &PrivateKey) -> PublicKey {
        PublicKey(x448::PublicKey::from(&sk.0))
    }

    /// Returns `HpkeError::InvalidKeyExchange` if and only if the DH result
    /// is all-zero, as required by RFC 9180 §7.1.4. `x448::Secret`'s
    /// Diffie-Hellman already rejects low-order public keys and returns
    /// `None` in that case, so both checks collapse to one error variant.
    #[doc(hidden)]
    fn kex(sk: &PrivateKey, pk: &PublicKey) -> Result<KexResult, HpkeError> {
        let res = sk.0.as_diffie_hellman(&pk.0).ok_or(HpkeError::InvalidKeyExchange)?;
        if res.as_bytes().ct_eq(&[0u8; 56]).into() {
            Err(HpkeError::InvalidKeyExchange)
        } else {
            Ok(KexResult(res))
        }
    }

    // def DeriveKeyPair(ikm):
    //   dkp_prk = LabeledExtract(zero(0), "dkp_prk", ikm)
    //   sk = LabeledExpand(dkp_prk, "sk", zero(0), Nsk)
    //   return (sk, pk(sk))
    #[doc(hidden)]
    fn derive_keypair<Kdf: KdfTrait>(suite_id: &KemSuiteId, ikm: &[u8]) -> (PrivateKey, PublicKey) {
        let (_, hkdf_ctx) = labeled_extract::<Kdf>(&[], suite_id, b"dkp_prk", ikm);
        let mut buf = [0u8; 56];
        hkdf_ctx
            .labeled_expand(suite_id, b"sk", &[], &mut buf)
            .expect("Nsk is always within an HKDF's hashable range");

        let sk = x448::Secret::from_bytes(&buf).expect("LabeledExpand output is always well-formed");
        let pk = x448::PublicKey::from(&sk);

        (PrivateKey(sk), PublicKey(pk))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        kex::{
            x448::{PrivateKey, PublicKey, X448},
            Deserializable, KeyExchange, Serializable,
        },
        test_util::kex_gen_keypair,
    };
    use rand::{rngs::StdRng, SeedableRng};

    impl PartialEq for PrivateKey {
        fn eq(&self, other: &PrivateKey) -> bool {
            self.0.as_bytes() == other.0.as_bytes()
        }
    }

    impl PartialEq for PublicKey {
        fn eq(&self, other: &PublicKey) -> bool {
            self.0.as_bytes() == other.0.as_bytes()
        }
    }

    #[test]
    fn test_dh_serialize_correctness() {
        type Kex = X448;

        let mut csprng = StdRng::from_entropy();
        let (sk, pk) = kex_gen_keypair::<Kex, _>(&mut csprng);
        let (sk_bytes, pk_bytes) = (sk.to_bytes(), pk.to_bytes());

        let new_sk = <Kex as KeyExchange>::PrivateKey::from_bytes(&sk_bytes).unwrap();
        let new_pk = <Kex as KeyExchange>::PublicKey::from_bytes(&pk_bytes).unwrap();

        assert!(new_sk == sk, "private key doesn't serialize correctly");
        assert!(new_pk == pk, "public key doesn't serialize correctly");
    }
}
