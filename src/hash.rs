//! Deterministic key identifier derivation.

// std
use std::fmt::Write;
// crates.io
use sha2::{Digest, Sha256};

/// Derive the key identifier for a piece of key material.
///
/// The identifier is the hex-encoded SHA-256 digest of the canonical byte
/// representation of the key. Issuing and verifying sides derive the same `kid`
/// from the same material, so no coordination channel is needed to agree on key
/// names and identifiers are never allocated or persisted separately.
pub fn key_id(material: &[u8]) -> String {
	let digest = Sha256::digest(material);
	let mut hex = String::with_capacity(digest.len() * 2);

	for byte in digest {
		let _ = write!(hex, "{byte:02x}");
	}

	hex
}
