//! HPKE operation modes (RFC 9180 §5): how the sender optionally
//! authenticates itself to the receiver, via a PSK, an identity keypair, or
//! both.

use crate::kex::KeyExchange;

/// Preshared key bytes and an identifier, to be embedded in an [`OpModeR`]
/// or [`OpModeS`].
#[derive(Clone, Copy)]
pub struct PskBundle<'a> {
    /// The preshared key.
    pub psk: &'a [u8],
    /// A bytestring that uniquely identifies this PSK.
    pub psk_id: &'a [u8],
}

/// The operation mode of the HPKE session, receiver's view.
pub enum OpModeR<'a, Kex: KeyExchange> {
    /// No sender authentication.
    Base,
    /// A preshared key known to the sender and receiver.
    Psk(PskBundle<'a>),
    /// The sender's identity public key.
    Auth(Kex::PublicKey),
    /// Both of the above.
    AuthPsk(Kex::PublicKey, PskBundle<'a>),
}

impl<'a, Kex: KeyExchange> OpModeR<'a, Kex> {
    /// The sender's identity public key, if this mode carries one.
    pub(crate) fn get_pk_sender_id(&self) -> Option<&Kex::PublicKey> {
        match self {
            OpModeR::Auth(pk) => Some(pk),
            OpModeR::AuthPsk(pk, _) => Some(pk),
            _ => None,
        }
    }
}

/// The operation mode of the HPKE session, sender's view.
pub enum OpModeS<'a, Kex: KeyExchange> {
    /// No sender authentication.
    Base,
    /// A preshared key known to the sender and receiver.
    Psk(PskBundle<'a>),
    /// The sender's own identity keypair.
    Auth((Kex::PrivateKey, Kex::PublicKey)),
    /// Both of the above.
    AuthPsk((Kex::PrivateKey, Kex::PublicKey), PskBundle<'a>),
}

impl<'a, Kex: KeyExchange> OpModeS<'a, Kex> {
    /// The sender's identity keypair, if this mode carries one.
    pub(crate) fn get_sender_id_keypair(&self) -> Option<&(Kex::PrivateKey, Kex::PublicKey)> {
        match self {
            OpModeS::Auth(keypair) => Some(keypair),
            OpModeS::AuthPsk(keypair, _) => Some(keypair),
            _ => None,
        }
    }
}

/// Convenience accessors shared by [`OpModeR`] and [`OpModeS`], used by the
/// key schedule to fetch mode-dependent defaults without matching twice.
pub(crate) trait OpMode<Kex: KeyExchange> {
    /// The mode identifier mixed into the key schedule context (RFC 9180 §5,
    /// Table 3): `0x00` Base, `0x01` PSK, `0x02` Auth, `0x03` AuthPSK.
    fn mode_id(&self) -> u8;
    /// The PSK bytes, or `&[]` if this isn't a PSK mode.
    fn get_psk_bytes(&self) -> &[u8];
    /// The PSK identifier, or `&[]` if this isn't a PSK mode.
    fn get_psk_id(&self) -> &[u8];
}

impl<'a, Kex: KeyExchange> OpMode<Kex> for OpModeR<'a, Kex> {
    fn mode_id(&self) -> u8 {
        match self {
            OpModeR::Base => 0x00,
            OpModeR::Psk(..) => 0x01,
            OpModeR::Auth(..) => 0x02,
            OpModeR::AuthPsk(..) => 0x03,
        }
    }

    fn get_psk_bytes(&self) -> &[u8] {
        match self {
            OpModeR::Psk(bundle) => bundle.psk,
            OpModeR::AuthPsk(_, bundle) => bundle.psk,
            _ => &[],
        }
    }

    fn get_psk_id(&self) -> &[u8] {
        match self {
            OpModeR::Psk(p) => p.psk_id,
            OpModeR::AuthPsk(_, p) => p.psk_id,
            _ => &[],
        }
    }
}

impl<'a, Kex: KeyExchange> OpMode<Kex> for OpModeS<'a, Kex> {
    fn mode_id(&self) -> u8 {
        match self {
            OpModeS::Base => 0x00,
            OpModeS::Psk(..) => 0x01,
            OpModeS::Auth(..) => 0x02,
            OpModeS::AuthPsk(..) => 0x03,
        }
    }

    fn get_psk_bytes(&self) -> &[u8] {
        match self {
            OpModeS::Psk(bundle) => bundle.psk,
            OpModeS::AuthPsk(_, bundle) => bundle.psk,
            _ => &[],
        }
    }

    fn get_psk_id(&self) -> &[u8] {
        match self {
            OpModeS::Psk(p) => p.psk_id,
            OpModeS::AuthPsk(_, p) => p.psk_id,
            _ => &[],
        }
    }
}
