//! Recognized configuration for the trust components.

// std
use std::collections::HashMap;
// crates.io
use serde::{Deserialize, Serialize};
use url::Url;
// self
use crate::_prelude::*;

/// Default per-attempt timeout for keyset endpoint fetches, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 3;

/// Configuration recognized by the issuer, rotator, and verifier.
///
/// Durations are carried in whole seconds to match the wire option names.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustConfig {
	/// Credential cache time-to-live in seconds.
	pub cache_expiry: u64,
	/// Propagation grace period in seconds before a new key may sign.
	pub new_cert_delay: u64,
	/// Issuer identity to keyset endpoint table.
	#[serde(default)]
	pub service_mappings: HashMap<String, Url>,
	/// Allow-list of trusted issuer identities.
	#[serde(default)]
	pub valid_issuers: Vec<String>,
	/// Per-attempt timeout in seconds for keyset endpoint fetches.
	#[serde(default = "default_fetch_timeout")]
	pub fetch_timeout: u64,
	/// Whether keyset endpoints must use HTTPS.
	#[serde(default = "default_true")]
	pub require_https: bool,
}
impl TrustConfig {
	/// Construct a configuration with the given cache ttl and propagation delay.
	pub fn new(cache_expiry: u64, new_cert_delay: u64) -> Self {
		Self {
			cache_expiry,
			new_cert_delay,
			service_mappings: HashMap::new(),
			valid_issuers: Vec::new(),
			fetch_timeout: DEFAULT_FETCH_TIMEOUT_SECS,
			require_https: true,
		}
	}

	/// Register a trusted issuer together with its keyset endpoint.
	pub fn with_issuer(mut self, iss: impl Into<String>, endpoint: impl AsRef<str>) -> Result<Self> {
		let iss = iss.into();
		let endpoint = Url::parse(endpoint.as_ref())?;

		self.valid_issuers.push(iss.clone());
		self.service_mappings.insert(iss, endpoint);

		Ok(self)
	}

	/// Set the HTTPS requirement for keyset endpoints.
	pub fn with_require_https(mut self, require_https: bool) -> Self {
		self.require_https = require_https;

		self
	}

	/// Credential cache time-to-live.
	pub fn cache_ttl(&self) -> Duration {
		Duration::from_secs(self.cache_expiry)
	}

	/// Propagation grace period before a new key may sign.
	pub fn propagation_delay(&self) -> Duration {
		Duration::from_secs(self.new_cert_delay)
	}

	/// Validate the configuration against the documented constraints.
	pub fn validate(&self) -> Result<()> {
		if self.cache_expiry == 0 {
			return Err(Error::Validation {
				field: "cacheExpiry",
				reason: "Must be at least one second.".into(),
			});
		}
		if self.new_cert_delay < self.cache_expiry {
			return Err(Error::Validation {
				field: "newCertDelay",
				reason: "Must be at least cacheExpiry so every verifier cache can observe a new key before it signs.".into(),
			});
		}
		if self.fetch_timeout == 0 {
			return Err(Error::Validation {
				field: "fetchTimeout",
				reason: "Must be at least one second.".into(),
			});
		}
		if self.valid_issuers.is_empty() {
			return Err(Error::Validation {
				field: "validIssuers",
				reason: "Must name at least one trusted issuer.".into(),
			});
		}

		for iss in &self.valid_issuers {
			let Some(endpoint) = self.service_mappings.get(iss) else {
				return Err(Error::Validation {
					field: "serviceMappings",
					reason: format!("Missing keyset endpoint for issuer '{iss}'."),
				});
			};

			if self.require_https && endpoint.scheme() != "https" {
				return Err(Error::Validation {
					field: "serviceMappings",
					reason: format!("Keyset endpoint {endpoint} must use HTTPS."),
				});
			}
		}

		Ok(())
	}
}

fn default_fetch_timeout() -> u64 {
	DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_true() -> bool {
	true
}
