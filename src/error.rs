//! Crate-wide error types and `Result` alias.

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the trust toolkit.
///
/// Validation errors are terminal and surfaced immediately. Transient store or
/// network failures belong to the owning collaborator and surface here as
/// [`Error::Store`] once its retries are exhausted. Per-key signature mismatches
/// are never exposed individually; verification reports the aggregate
/// [`Error::AuthFailed`] only.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Task(#[from] tokio::task::JoinError),

	#[error(transparent)]
	Jsonwebtoken(#[from] jsonwebtoken::errors::Error),
	#[error(transparent)]
	Pkcs8(#[from] rsa::pkcs8::Error),
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	Rsa(#[from] rsa::Error),
	#[error(transparent)]
	Serde(#[from] serde_json::Error),
	#[error(transparent)]
	Spki(#[from] rsa::pkcs8::spki::Error),
	#[error(transparent)]
	Url(#[from] url::ParseError),

	#[error("Signature matches no advertised key for the issuer.")]
	AuthFailed,
	#[error("Authorization token has expired.")]
	AuthTokenExpired,
	#[error("Issuer '{0}' is not in the trusted issuer allow-list.")]
	AuthTokenIssuerInvalid(String),
	#[error("Authorization token is malformed: {0}")]
	InvalidAuthToken(String),
	#[error("No usable signing key is available.")]
	NoUsableKey,
	#[error("Key store error: {0}")]
	Store(String),
	#[error("Validation failed for {field}: {reason}")]
	Validation { field: &'static str, reason: String },
}
