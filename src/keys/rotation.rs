//! Two-slot signing key rotation with a propagation grace window.
//!
//! A freshly generated key must not sign tokens until every verifying service
//! has had a fair chance to refresh its key-set cache and learn the new key.
//! `new_cert_delay` must therefore be at least the largest credential cache ttl
//! any verifier uses, plus margin for store propagation latency. Promotion is a
//! pure function of elapsed time, so no in-process flag or lock is needed
//! beyond the store's own atomic writes.

// self
use crate::{
	_prelude::*,
	keys::{
		material::{DEFAULT_KEY_BITS, KeyPair, KeyStatus},
		store::KeyMaterialStore,
	},
};

/// Generates signing key pairs on a schedule and resolves the usable one.
#[derive(Clone)]
pub struct KeyRotator {
	store: Arc<dyn KeyMaterialStore>,
	new_cert_delay: Duration,
	key_bits: usize,
}
impl KeyRotator {
	/// Build a rotator over the given store and propagation delay.
	pub fn new(store: Arc<dyn KeyMaterialStore>, new_cert_delay: Duration) -> Self {
		Self { store, new_cert_delay, key_bits: DEFAULT_KEY_BITS }
	}

	/// Override the RSA modulus size used for generated keys.
	pub fn with_key_bits(mut self, key_bits: usize) -> Self {
		self.key_bits = key_bits;

		self
	}

	/// Configured propagation delay before a new key may sign.
	pub fn new_cert_delay(&self) -> Duration {
		self.new_cert_delay
	}

	/// Generate a fresh key pair and persist it in pending status.
	pub async fn rotate(&self) -> Result<KeyPair> {
		let created_at = Utc::now();
		let bits = self.key_bits;
		// RSA generation is CPU-bound; keep it off the async workers.
		let pair = tokio::task::spawn_blocking(move || KeyPair::generate(bits, created_at)).await??;

		self.store.put(pair.clone()).await?;

		tracing::info!(kid = %pair.kid, "generated and stored new signing key pair");

		Ok(pair)
	}

	/// Resolve the key pair currently usable for signing.
	pub async fn usable_key(&self) -> Result<KeyPair> {
		let recent = self.store.list_recent(2).await?;

		select_usable(recent, Utc::now(), self.new_cert_delay)
	}

	/// Key pairs currently advertised to verifiers, statuses annotated.
	///
	/// Normally the primary plus the grace-window secondary; a pending key is
	/// advertised ahead of its promotion so verifier caches can pick it up.
	pub async fn advertised_keys(&self) -> Result<Vec<KeyPair>> {
		let recent = self.store.list_recent(2).await?;
		let annotated = annotate_statuses(recent, Utc::now(), self.new_cert_delay);

		if annotated.is_empty() {
			return Err(Error::NoUsableKey);
		}

		Ok(annotated)
	}
}

/// Annotate the two most recent key pairs (newest first) with their rotation
/// statuses at `now`.
///
/// The newest key is primary once `new_cert_delay` has elapsed since its
/// creation; until then it stays pending and the second-newest keeps signing.
/// Exactly one returned pair is [`KeyStatus::Primary`].
pub fn annotate_statuses(
	mut recent: Vec<KeyPair>,
	now: DateTime<Utc>,
	new_cert_delay: Duration,
) -> Vec<KeyPair> {
	recent.truncate(2);

	match recent.len() {
		0 => Vec::new(),
		// A sole key has no predecessor any verifier could prefer, so it is
		// usable immediately regardless of the delay.
		1 => {
			recent[0].status = KeyStatus::Primary;

			recent
		},
		_ => {
			let promoted = TimeDelta::from_std(new_cert_delay)
				.map(|delay| now >= recent[0].created_at + delay)
				.unwrap_or(false);

			if promoted {
				recent[0].status = KeyStatus::Primary;
				recent[1].status = KeyStatus::Secondary;
			} else {
				recent[0].status = KeyStatus::Pending;
				recent[1].status = KeyStatus::Primary;
			}

			recent
		},
	}
}

/// Pure selection of the usable signing key from the most recent pairs.
pub fn select_usable(
	recent: Vec<KeyPair>,
	now: DateTime<Utc>,
	new_cert_delay: Duration,
) -> Result<KeyPair> {
	annotate_statuses(recent, now, new_cert_delay)
		.into_iter()
		.find(|pair| pair.status == KeyStatus::Primary)
		.ok_or(Error::NoUsableKey)
}
