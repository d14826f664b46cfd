//! Inbound token verification against trusted issuers.

// std
use std::collections::HashMap;
// crates.io
use base64::prelude::*;
use jsonwebtoken::{
	Algorithm, DecodingKey, Header, Validation,
	jwk::{Jwk, JwkSet, KeyAlgorithm},
};
use reqwest::Client;
use url::Url;
// self
use crate::{
	_prelude::*,
	cache::CredentialCache,
	config::TrustConfig,
	token::{Claims, validate_algorithm},
};

/// Verifies inbound identity tokens against the configured trusted issuers.
///
/// Verification is a linear, fail-fast pipeline: untrusted decode, then the
/// temporal and issuer checks, then key resolution, then signature checks.
/// Issuer validity is checked before any network call so no key set is ever
/// fetched on behalf of an untrusted issuer. The per-issuer key-set caches are
/// process-scoped; construct the verifier once and share it across requests.
#[derive(Debug)]
pub struct TokenVerifier {
	issuers: HashMap<String, IssuerKeys>,
}
impl TokenVerifier {
	/// Build a verifier from the recognized configuration.
	pub fn from_config(config: &TrustConfig) -> Result<Self> {
		config.validate()?;

		let client = Client::builder()
			.user_agent(format!("svc-trust/{}", env!("CARGO_PKG_VERSION")))
			.connect_timeout(Duration::from_secs(5))
			.build()?;
		let ttl = config.cache_ttl();
		let timeout = Duration::from_secs(config.fetch_timeout);
		let mut issuers = HashMap::with_capacity(config.valid_issuers.len());

		for iss in &config.valid_issuers {
			let endpoint =
				config.service_mappings.get(iss).cloned().ok_or_else(|| Error::Validation {
					field: "serviceMappings",
					reason: format!("Missing keyset endpoint for issuer '{iss}'."),
				})?;
			let key_cache = CredentialCache::new(format!("keyset:{iss}"), ttl, {
				let client = client.clone();
				let endpoint = endpoint.clone();

				move || fetch_key_set(client.clone(), endpoint.clone(), timeout)
			});

			issuers.insert(iss.clone(), IssuerKeys { key_cache });
		}

		Ok(Self { issuers })
	}

	/// Verify an inbound token, returning its claims when authorized.
	#[tracing::instrument(skip(self, token))]
	pub async fn verify(&self, token: &str) -> Result<Claims> {
		// Decode without trust; nothing here is believed until the signature
		// checks out.
		let (header, claims) = decode_untrusted(token)?;

		validate_algorithm(header.alg)?;

		// Temporal and issuer checks come before any network call so key sets
		// are never resolved for an untrusted issuer.
		if claims.exp < Utc::now().timestamp() {
			return Err(Error::AuthTokenExpired);
		}

		let issuer = self
			.issuers
			.get(&claims.iss)
			.ok_or_else(|| Error::AuthTokenIssuerInvalid(claims.iss.clone()))?;
		let key_set = issuer.key_cache.get_data().await?;
		let claims = verify_signature(token, header.alg, &key_set)?;

		tracing::debug!(iss = %claims.iss, "token authorized");

		Ok(claims)
	}
}

#[derive(Debug)]
struct IssuerKeys {
	key_cache: CredentialCache<Arc<JwkSet>>,
}

/// Parse a token's header and payload without verifying the signature.
fn decode_untrusted(token: &str) -> Result<(Header, Claims)> {
	let header = jsonwebtoken::decode_header(token)
		.map_err(|err| Error::InvalidAuthToken(err.to_string()))?;
	let mut segments = token.split('.');
	let (Some(_), Some(payload), Some(signature), None) =
		(segments.next(), segments.next(), segments.next(), segments.next())
	else {
		return Err(Error::InvalidAuthToken("Expected three dot-separated segments.".into()));
	};

	if signature.is_empty() {
		return Err(Error::InvalidAuthToken("Missing signature segment.".into()));
	}

	let payload = BASE64_URL_SAFE_NO_PAD
		.decode(payload)
		.map_err(|err| Error::InvalidAuthToken(format!("Invalid payload encoding: {err}.")))?;
	let claims = serde_json::from_slice::<Claims>(&payload)
		.map_err(|err| Error::InvalidAuthToken(format!("Invalid payload JSON: {err}.")))?;

	Ok((header, claims))
}

/// Try each candidate key in set order; the first that verifies wins.
///
/// Individual mismatches are deliberately not surfaced so callers learn nothing
/// about the trusted key inventory; only the aggregate outcome is visible.
fn verify_signature(token: &str, algorithm: Algorithm, key_set: &JwkSet) -> Result<Claims> {
	let mut validation = Validation::new(algorithm);

	validation.validate_aud = false;

	for jwk in &key_set.keys {
		if !jwk_matches_algorithm(jwk, algorithm) {
			continue;
		}

		let Ok(decoding_key) = DecodingKey::from_jwk(jwk) else {
			tracing::debug!(kid = jwk.common.key_id.as_deref().unwrap_or_default(), "skipping undecodable key");

			continue;
		};

		if let Ok(data) = jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation) {
			return Ok(data.claims);
		}
	}

	Err(Error::AuthFailed)
}

/// Cross-check the token's asserted algorithm against the key's declared one.
fn jwk_matches_algorithm(jwk: &Jwk, algorithm: Algorithm) -> bool {
	matches!(
		(jwk.common.key_algorithm, algorithm),
		(Some(KeyAlgorithm::RS256), Algorithm::RS256)
			| (Some(KeyAlgorithm::RS384), Algorithm::RS384)
			| (Some(KeyAlgorithm::RS512), Algorithm::RS512)
	)
}

/// Fetch a trusted issuer's key set with an explicit per-attempt timeout.
async fn fetch_key_set(client: Client, endpoint: Url, timeout: Duration) -> Result<Arc<JwkSet>> {
	let started = Instant::now();
	let response = client.get(endpoint.clone()).timeout(timeout).send().await?;
	let status = response.status();

	if !status.is_success() {
		return Err(Error::Store(format!("Keyset endpoint {endpoint} returned HTTP {status}.")));
	}

	let key_set = response.json::<JwkSet>().await?;

	tracing::debug!(
		endpoint = %endpoint,
		keys = key_set.keys.len(),
		elapsed = ?started.elapsed(),
		"fetched issuer key set"
	);

	Ok(Arc::new(key_set))
}
