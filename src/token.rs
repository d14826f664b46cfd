//! Identity token issuance and verification.

pub mod issuer;
pub mod verifier;

// crates.io
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Signature algorithms accepted for issuance and verification.
///
/// Only asymmetric RSA algorithms are accepted; HMAC family algorithms would
/// let the published verification key forge tokens and are rejected outright.
pub const ACCEPTED_ALGORITHMS: &[Algorithm] =
	&[Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Registered and custom claims carried by an identity token.
///
/// Immutable once issued; custom claims are flattened alongside the registered
/// ones on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
	/// Issuer identity.
	pub iss: String,
	/// Expiry, seconds since the Unix epoch.
	pub exp: i64,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Caller-supplied custom claims.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Reject algorithms outside the accepted set before any crypto work.
pub fn validate_algorithm(algorithm: Algorithm) -> Result<()> {
	if ACCEPTED_ALGORITHMS.contains(&algorithm) {
		Ok(())
	} else {
		Err(Error::Validation {
			field: "algorithm",
			reason: format!("{algorithm:?} is not an accepted signature algorithm."),
		})
	}
}
