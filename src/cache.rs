//! Time-boxed credential cache with single-flight refresh.

// std
use std::{
	fmt::{Debug, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
};
// crates.io
use tokio::sync::{Mutex, RwLock};
// self
use crate::{_prelude::*, metrics::CacheMetrics};

type RefreshFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;
type RefreshFn<T> = Arc<dyn Fn() -> RefreshFuture<T> + Send + Sync>;
type MappingFn<T> = Arc<dyn Fn(T) -> Result<T> + Send + Sync>;

/// Generic time-boxed cache around a caller-supplied refresh operation.
///
/// One instance owns one [`CacheEntry`] and is shared across concurrent
/// invocations within a warm process. Refreshes are serialised per instance:
/// concurrent callers observing an expired entry produce exactly one backing
/// fetch, with late arrivals re-reading the freshly stored data instead of
/// fetching again.
///
/// A failed refresh leaves the entry in its last-known-good state. When stale
/// data exists it is served with a warning so a transient backing-store outage
/// degrades to stale credentials rather than failing outright; callers that
/// need freshness guarantees must invalidate explicitly.
pub struct CredentialCache<T> {
	name: Arc<str>,
	ttl: Duration,
	refresh: RefreshFn<T>,
	mapping: Option<MappingFn<T>>,
	entry: Arc<RwLock<Option<CacheEntry<T>>>>,
	single_flight: Arc<Mutex<()>>,
	metrics: Arc<CacheMetrics>,
}
impl<T> CredentialCache<T>
where
	T: Clone + Send + Sync + 'static,
{
	/// Build a cache around the supplied refresh operation and ttl.
	pub fn new<F, Fut>(name: impl Into<Arc<str>>, ttl: Duration, refresh: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<T>> + Send + 'static,
	{
		let name = name.into();

		Self {
			metrics: CacheMetrics::new(name.clone()),
			name,
			ttl,
			refresh: Arc::new(move || Box::pin(refresh()) as RefreshFuture<T>),
			mapping: None,
			entry: Arc::new(RwLock::new(None)),
			single_flight: Arc::new(Mutex::new(())),
		}
	}

	/// Attach a post-processor applied to refreshed data before it is stored.
	pub fn with_mapping<M>(mut self, mapping: M) -> Self
	where
		M: Fn(T) -> Result<T> + Send + Sync + 'static,
	{
		self.mapping = Some(Arc::new(mapping));

		self
	}

	/// Configured time-to-live for cached data.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Access the per-cache metrics accumulator.
	pub fn metrics(&self) -> Arc<CacheMetrics> {
		self.metrics.clone()
	}

	/// Return cached data, refreshing through the backing operation on expiry.
	pub async fn get_data(&self) -> Result<T> {
		if let Some(data) = self.fresh_data().await {
			self.metrics.record_hit(false);

			return Ok(data);
		}

		// Serialise the refresh; whoever loses the race re-reads the entry the
		// winner just stored instead of fetching again.
		let _guard = self.single_flight.lock().await;

		if let Some(data) = self.fresh_data().await {
			self.metrics.record_hit(false);

			return Ok(data);
		}

		self.metrics.record_miss();
		self.refresh_locked().await
	}

	/// Drop the cached entry so the next access performs a refresh.
	pub async fn invalidate(&self) {
		let mut guard = self.entry.write().await;

		*guard = None;
	}

	async fn fresh_data(&self) -> Option<T> {
		let now = Instant::now();
		let guard = self.entry.read().await;

		match guard.as_ref() {
			Some(entry) if !entry.is_expired(now, self.ttl) => Some(entry.data.clone()),
			_ => None,
		}
	}

	async fn refresh_locked(&self) -> Result<T> {
		let started = Instant::now();

		match (self.refresh)().await {
			Ok(data) => {
				let data = match &self.mapping {
					Some(mapping) => mapping(data)?,
					None => data,
				};

				{
					let mut guard = self.entry.write().await;

					*guard =
						Some(CacheEntry { data: data.clone(), last_refreshed_at: Instant::now() });
				}

				self.metrics.record_refresh_success(started.elapsed());

				tracing::debug!(cache = %self.name, elapsed = ?started.elapsed(), "cache refreshed");

				Ok(data)
			},
			Err(err) => {
				self.metrics.record_refresh_error();

				let guard = self.entry.read().await;

				if let Some(entry) = guard.as_ref() {
					tracing::warn!(
						cache = %self.name,
						error = %err,
						"refresh failed; serving last-known-good data"
					);

					self.metrics.record_hit(true);

					Ok(entry.data.clone())
				} else {
					Err(err)
				}
			},
		}
	}
}
impl<T> Clone for CredentialCache<T> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			ttl: self.ttl,
			refresh: self.refresh.clone(),
			mapping: self.mapping.clone(),
			entry: self.entry.clone(),
			single_flight: self.single_flight.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<T> Debug for CredentialCache<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("CredentialCache").field("name", &self.name).field("ttl", &self.ttl).finish()
	}
}

/// Cached data plus the instant it was last refreshed.
///
/// Owned exclusively by one [`CredentialCache`]; refreshed in place and
/// discarded with the owning process. It has no durable identity.
#[derive(Clone, Debug)]
struct CacheEntry<T> {
	data: T,
	last_refreshed_at: Instant,
}
impl<T> CacheEntry<T> {
	fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
		now.saturating_duration_since(self.last_refreshed_at) >= ttl
	}
}
