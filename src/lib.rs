//! An implementation of HPKE (Hybrid Public Key Encryption), as specified in
//! [RFC 9180](https://www.rfc-editor.org/rfc/rfc9180.html).
//!
//! HPKE combines a Key Encapsulation Mechanism (KEM), a Key Derivation
//! Function (KDF), and an Authenticated Encryption with Associated Data
//! (AEAD) scheme so that a sender can, using only the receiver's public key,
//! set up a symmetric encryption channel to that receiver.
//!
//! The crate has two layers:
//!
//! * a generic, compile-time-typed core ([`setup_sender`], [`setup_receiver`],
//!   [`SenderContext`], [`ReceiverContext`]) where the ciphersuite
//!   `(Aead, Kdf, Kem)` is a type parameter. This is the zero-cost,
//!   `no_std`-friendly path.
//! * a [`suite`] module that assembles a ciphersuite from three runtime
//!   identifiers, for callers (protocol implementations, test harnesses) that
//!   only learn the ciphersuite at runtime.
#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod util;

pub mod aead;
mod error;
pub mod kdf;
pub mod kem;
pub mod kex;
pub mod op_mode;

mod context;
mod setup;

#[cfg(feature = "alloc")]
mod serialize;

#[cfg(feature = "alloc")]
pub mod suite;


#[cfg(test)]
mod test_util;

pub use crate::context::{ExporterSecret, ReceiverContext, SenderContext};
pub use crate::error::HpkeError;
pub use crate::kex::{Deserializable, Serializable};
pub use crate::op_mode::{OpModeR, OpModeS, PskBundle};
#[cfg(feature = "alloc")]
pub use crate::serialize::{unmarshal_receiver, unmarshal_sender, MarshalledContext, Role};
pub use crate::setup::{
    setup_auth_psk_r, setup_auth_psk_s, setup_auth_r, setup_auth_s, setup_base_r, setup_base_s,
    setup_psk_r, setup_psk_s, setup_receiver, setup_sender,
};
