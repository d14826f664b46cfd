//! Public key-set (JWKS) rendering.

// crates.io
use base64::prelude::*;
use jsonwebtoken::jwk::{
	AlgorithmParameters, CommonParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse,
	RSAKeyParameters, RSAKeyType,
};
// self
use crate::{_prelude::*, keys::material::KeyPair, keys::rotation::KeyRotator};

/// Renders the currently advertised public keys as a key-set document.
///
/// The document carries the primary and the grace-window secondary so verifiers
/// holding an older copy keep validating tokens signed by either. Rendering is
/// a pure function of the underlying key state; repeated calls over unchanged
/// keys produce byte-identical documents.
#[derive(Clone)]
pub struct KeySetPublisher {
	rotator: KeyRotator,
}
impl KeySetPublisher {
	/// Build a publisher over the given rotator.
	pub fn new(rotator: KeyRotator) -> Self {
		Self { rotator }
	}

	/// Render the current advertised keys as a JWKS document.
	pub async fn key_set(&self) -> Result<JwkSet> {
		let pairs = self.rotator.advertised_keys().await?;

		render_key_set(&pairs)
	}
}

/// Render key pairs into a JWKS, preserving order.
///
/// Only public material is read; private keys never reach the document.
pub fn render_key_set(pairs: &[KeyPair]) -> Result<JwkSet> {
	let mut keys = Vec::with_capacity(pairs.len());

	for pair in pairs {
		keys.push(render_jwk(pair)?);
	}

	Ok(JwkSet { keys })
}

fn render_jwk(pair: &KeyPair) -> Result<Jwk> {
	let der = pair.public_key_der()?;
	let (n, e) = pair.rsa_components()?;

	Ok(Jwk {
		common: CommonParameters {
			public_key_use: Some(PublicKeyUse::Signature),
			key_algorithm: Some(KeyAlgorithm::RS256),
			key_id: Some(pair.kid.clone()),
			x509_chain: Some(vec![BASE64_STANDARD.encode(&der)]),
			..Default::default()
		},
		algorithm: AlgorithmParameters::RSA(RSAKeyParameters {
			key_type: RSAKeyType::RSA,
			n: BASE64_URL_SAFE_NO_PAD.encode(&n),
			e: BASE64_URL_SAFE_NO_PAD.encode(&e),
		}),
	})
}
