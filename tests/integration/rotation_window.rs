//! Rotation propagation behaviour observed through issuance.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use serde_json::Map;
use svc_trust::{KeyRotator, KeySetPublisher, KeyStatus, MemoryKeyStore, Result, TokenIssuer};

const NEW_CERT_DELAY: Duration = Duration::from_secs(600);

#[tokio::test]
async fn issuance_keeps_signing_with_the_prior_key_until_promotion() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	let store = Arc::new(MemoryKeyStore::new());
	let rotator = KeyRotator::new(store, NEW_CERT_DELAY);
	let first = rotator.rotate().await?;

	// A zero ttl makes the issuer re-resolve its signing key on every call, so
	// each issuance observes the store's current selection.
	let issuer = TokenIssuer::new("svc-a", rotator.clone(), Duration::ZERO);
	let token = issuer
		.generate(Map::new(), Duration::from_secs(300), jsonwebtoken::Algorithm::RS256)
		.await?;

	assert_eq!(signing_kid(&token), first.kid);

	// The fresh pair sits out its propagation delay; issuance sticks with the
	// established key.
	let second = rotator.rotate().await?;
	let token = issuer
		.generate(Map::new(), Duration::from_secs(300), jsonwebtoken::Algorithm::RS256)
		.await?;

	assert_eq!(signing_kid(&token), first.kid);
	assert_ne!(second.kid, first.kid);

	Ok(())
}

#[tokio::test]
async fn advertised_set_covers_pending_and_primary_during_the_window() -> Result<()> {
	let store = Arc::new(MemoryKeyStore::new());
	let rotator = KeyRotator::new(store, NEW_CERT_DELAY);
	let first = rotator.rotate().await?;
	let second = rotator.rotate().await?;
	let advertised = rotator.advertised_keys().await?;

	assert_eq!(advertised.len(), 2);
	assert_eq!(advertised[0].kid, second.kid);
	assert_eq!(advertised[0].status, KeyStatus::Pending);
	assert_eq!(advertised[1].kid, first.kid);
	assert_eq!(advertised[1].status, KeyStatus::Primary);

	// The published document advertises both so verifier caches can learn the
	// pending key before it ever signs.
	let key_set = KeySetPublisher::new(rotator).key_set().await?;
	let kids: Vec<_> =
		key_set.keys.iter().filter_map(|key| key.common.key_id.as_deref()).collect();

	assert!(kids.contains(&second.kid.as_str()));
	assert!(kids.contains(&first.kid.as_str()));

	Ok(())
}

fn signing_kid(token: &str) -> String {
	jsonwebtoken::decode_header(token).expect("decodable header").kid.expect("kid present")
}
