//! Signed identity token issuance.

// std
use std::fmt::{Debug, Formatter, Result as FmtResult};
// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	cache::CredentialCache,
	keys::rotation::KeyRotator,
	token::{Claims, validate_algorithm},
};

/// Signing key resolved from the store, ready for token issuance.
#[derive(Clone)]
pub struct SigningKey {
	/// Content-hash identifier embedded in issued token headers.
	pub kid: String,
	/// Private key material prepared for signing.
	pub encoding_key: EncodingKey,
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("SigningKey").field("kid", &self.kid).finish_non_exhaustive()
	}
}

/// Issues signed identity tokens for one issuer identity.
///
/// The usable signing key is read through a process-scoped [`CredentialCache`]
/// backed by the rotator's time-based selection, so issuance does not hit the
/// key store on every call. Signing itself is local and deterministic once the
/// key is resolved; there is no retry logic here.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
	issuer: String,
	key_cache: CredentialCache<SigningKey>,
}
impl TokenIssuer {
	/// Build an issuer reading its signing key through a cache with the given ttl.
	pub fn new(issuer: impl Into<String>, rotator: KeyRotator, cache_expiry: Duration) -> Self {
		let key_cache = CredentialCache::new("signing-key", cache_expiry, move || {
			let rotator = rotator.clone();

			async move {
				let pair = rotator.usable_key().await?;
				let encoding_key = EncodingKey::from_rsa_pem(pair.private_key.as_bytes())?;

				Ok(SigningKey { kid: pair.kid, encoding_key })
			}
		});

		Self { issuer: issuer.into(), key_cache }
	}

	/// Issuer identity stamped into the `iss` claim.
	pub fn issuer(&self) -> &str {
		&self.issuer
	}

	/// Produce a signed token carrying the supplied custom claims.
	///
	/// Fails with [`Error::NoUsableKey`] when no signing key can be resolved.
	#[tracing::instrument(skip(self, claims), fields(issuer = %self.issuer))]
	pub async fn generate(
		&self,
		claims: Map<String, Value>,
		ttl: Duration,
		algorithm: Algorithm,
	) -> Result<String> {
		validate_algorithm(algorithm)?;

		let key = self.key_cache.get_data().await?;
		let now = Utc::now();
		let ttl = TimeDelta::from_std(ttl).map_err(|err| Error::Validation {
			field: "ttl",
			reason: format!("Token lifetime out of range: {err}."),
		})?;
		let claims = Claims {
			iss: self.issuer.clone(),
			exp: (now + ttl).timestamp(),
			iat: now.timestamp(),
			extra: claims,
		};
		let mut header = Header::new(algorithm);

		header.kid = Some(key.kid.clone());

		let token = jsonwebtoken::encode(&header, &claims, &key.encoding_key)?;

		tracing::debug!(kid = %key.kid, "issued identity token");

		Ok(token)
	}
}
