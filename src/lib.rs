//! webauthn-rp-core - WebAuthn verification for Rust Relying Parties
//!
//! Webauthn is a standard allowing communication between servers, browsers and authenticators
//! to allow strong, passwordless, cryptographic authentication to be performed. This crate
//! implements the Relying Party side of the two ceremonies: it issues registration and
//! authentication challenges, and verifies the binary attestation and assertion responses
//! produced by a client's authenticator.
//!
//! Credential and challenge persistence are deliberately out of scope - you supply them
//! through the [`store::CredentialStore`] and [`store::ChallengeStore`] traits, and the
//! [`core::Webauthn`] orchestrator drives the verification between those boundaries.

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]

#[macro_use]
extern crate tracing;

#[macro_use]
mod macros;

mod constants;

pub mod attestation;
pub mod core;
pub mod crypto;
pub mod error;
mod internals;
pub mod metadata;
pub mod proto;
pub mod store;

pub use crate::attestation::AttestationFormat;
pub use crate::core::{Authenticator, Webauthn, WebauthnOptions};
pub use crate::crypto::verify_attestation_ca_chain;
pub use crate::error::WebauthnError;
