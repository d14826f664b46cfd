//! Service-to-service trust toolkit: signed identity tokens, rotating RSA signing
//! keys, and cached key-set verification for modern Rust identity systems.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod hash;
pub mod keys;
pub mod keyset;
pub mod metrics;
pub mod token;

mod config;
mod error;
mod _prelude {
	pub use std::{sync::Arc, time::Duration};

	pub use chrono::{DateTime, TimeDelta, Utc};
	pub use tokio::time::Instant;

	pub use crate::{Error, Result};
}

pub use crate::{
	cache::CredentialCache,
	config::TrustConfig,
	error::{Error, Result},
	keys::{
		material::{KeyPair, KeyStatus},
		rotation::KeyRotator,
		store::{KeyMaterialStore, MemoryKeyStore},
	},
	keyset::KeySetPublisher,
	token::{Claims, issuer::TokenIssuer, verifier::TokenVerifier},
};
