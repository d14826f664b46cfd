//! End-to-end issue/verify round trips against a mock keyset endpoint.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use serde_json::{Map, Value, json};
use svc_trust::{
	Error, KeyRotator, KeySetPublisher, MemoryKeyStore, Result, TokenIssuer, TokenVerifier,
	TrustConfig,
};
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path},
};

const KEYSET_PATH: &str = "/.well-known/jwks.json";
const NEW_CERT_DELAY: Duration = Duration::from_secs(600);

struct Fixture {
	issuer: TokenIssuer,
	verifier: TokenVerifier,
	server: MockServer,
}

async fn fixture(expected_fetches: u64) -> Result<Fixture> {
	let _ = tracing_subscriber::fmt::try_init();

	let store = Arc::new(MemoryKeyStore::new());
	let rotator = KeyRotator::new(store, NEW_CERT_DELAY);

	rotator.rotate().await?;

	let publisher = KeySetPublisher::new(rotator.clone());
	let key_set = publisher.key_set().await?;
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(KEYSET_PATH))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(&key_set)
				.insert_header("content-type", "application/json"),
		)
		.expect(expected_fetches)
		.mount(&server)
		.await;

	let config = TrustConfig::new(300, 600)
		.with_issuer("svc-a", format!("{}{}", server.uri(), KEYSET_PATH))?
		.with_require_https(false);
	let issuer = TokenIssuer::new("svc-a", rotator, Duration::from_secs(300));
	let verifier = TokenVerifier::from_config(&config)?;

	Ok(Fixture { issuer, verifier, server })
}

fn subject_claims(sub: &str) -> Map<String, Value> {
	let mut claims = Map::new();

	claims.insert("sub".into(), json!(sub));

	claims
}

#[tokio::test]
async fn issued_token_verifies_and_claims_survive_the_round_trip() -> Result<()> {
	let fixture = fixture(1).await?;
	let token = fixture
		.issuer
		.generate(subject_claims("svcA"), Duration::from_secs(300), jsonwebtoken::Algorithm::RS256)
		.await?;
	let claims = fixture.verifier.verify(&token).await?;

	assert_eq!(claims.iss, "svc-a");
	assert_eq!(claims.extra.get("sub"), Some(&json!("svcA")));
	assert!(claims.exp > claims.iat);

	// A second verification within the cache ttl must not refetch the key set.
	fixture.verifier.verify(&token).await?;
	fixture.server.verify().await;

	Ok(())
}

#[tokio::test]
async fn token_signed_with_an_unadvertised_key_is_rejected() -> Result<()> {
	let fixture = fixture(1).await?;

	// A rogue signer under the same issuer identity, with keys the published
	// set has never advertised.
	let rogue_store = Arc::new(MemoryKeyStore::new());
	let rogue_rotator = KeyRotator::new(rogue_store, NEW_CERT_DELAY);

	rogue_rotator.rotate().await?;

	let rogue_issuer = TokenIssuer::new("svc-a", rogue_rotator, Duration::from_secs(300));
	let token = rogue_issuer
		.generate(subject_claims("svcA"), Duration::from_secs(300), jsonwebtoken::Algorithm::RS256)
		.await?;

	assert!(matches!(fixture.verifier.verify(&token).await, Err(Error::AuthFailed)));

	Ok(())
}

#[tokio::test]
async fn grace_window_token_verifies_while_both_keys_are_advertised() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	let store = Arc::new(MemoryKeyStore::new());
	let rotator = KeyRotator::new(store, NEW_CERT_DELAY);

	rotator.rotate().await?;

	let issuer = TokenIssuer::new("svc-a", rotator.clone(), Duration::from_secs(300));
	let token = issuer
		.generate(subject_claims("svcA"), Duration::from_secs(300), jsonwebtoken::Algorithm::RS256)
		.await?;

	// Rotation happens after issuance; the new pair is pending and the old one
	// keeps signing, so the advertised set must cover both.
	rotator.rotate().await?;

	let key_set = KeySetPublisher::new(rotator).key_set().await?;

	assert_eq!(key_set.keys.len(), 2);

	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(KEYSET_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(&key_set))
		.mount(&server)
		.await;

	let config = TrustConfig::new(300, 600)
		.with_issuer("svc-a", format!("{}{}", server.uri(), KEYSET_PATH))?
		.with_require_https(false);
	let verifier = TokenVerifier::from_config(&config)?;
	let claims = verifier.verify(&token).await?;

	assert_eq!(claims.extra.get("sub"), Some(&json!("svcA")));

	Ok(())
}

#[tokio::test]
async fn unreachable_keyset_endpoint_surfaces_a_fetch_error() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	let store = Arc::new(MemoryKeyStore::new());
	let rotator = KeyRotator::new(store, NEW_CERT_DELAY);

	rotator.rotate().await?;

	let issuer = TokenIssuer::new("svc-a", rotator, Duration::from_secs(300));
	let token = issuer
		.generate(subject_claims("svcA"), Duration::from_secs(300), jsonwebtoken::Algorithm::RS256)
		.await?;
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(KEYSET_PATH))
		.respond_with(ResponseTemplate::new(500))
		.mount(&server)
		.await;

	let config = TrustConfig::new(300, 600)
		.with_issuer("svc-a", format!("{}{}", server.uri(), KEYSET_PATH))?
		.with_require_https(false);
	let verifier = TokenVerifier::from_config(&config)?;

	// Cold cache plus failing endpoint: the fetch error propagates instead of
	// an authorization verdict.
	assert!(matches!(verifier.verify(&token).await, Err(Error::Store(_))));

	Ok(())
}
