//! Short-lived provider credential cache
//!
//! FCM OAuth access tokens and APNs provider JWTs are expensive to mint
//! (a signature each, plus a network round-trip for OAuth), so they are
//! cached keyed by issuer identity and scope. Entries are served while
//! they have more than [`EXPIRY_SLACK`] seconds of life left; refreshes
//! are single-flight per key so concurrent dispatches never stampede
//! the token endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use notiva_types::utils::sha256_hex;

use crate::prelude::*;

/// Seconds of remaining lifetime below which a token is considered stale
const EXPIRY_SLACK: i64 = 30;
/// Lower bound on stored lifetime, guards against tiny `expires_in`
const MIN_LIFETIME: i64 = 60;
/// Safety margin subtracted from the provider-reported lifetime
const LIFETIME_MARGIN: i64 = 60;

/// A freshly minted token with its provider-reported lifetime in seconds
#[derive(Debug)]
pub struct FreshToken {
	pub token: Box<str>,
	pub expires_in: i64,
}

#[derive(Debug)]
struct Entry {
	token: Arc<str>,
	expires_at: i64,
}

#[derive(Debug, Default)]
pub struct TokenCache {
	entries: Mutex<HashMap<Box<str>, Entry>>,
	// Per-key refresh locks, so a refresh for one issuer never blocks another
	refresh_locks: Mutex<HashMap<Box<str>, Arc<tokio::sync::Mutex<()>>>>,
}

impl TokenCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Return the cached token for `(issuer, scope)`, minting a new one
	/// through `refresh` if the cached one is missing or stale.
	pub async fn get_or_refresh<F, Fut>(
		&self,
		issuer: &str,
		scope: &str,
		refresh: F,
	) -> NvResult<Arc<str>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = NvResult<FreshToken>>,
	{
		let key: Box<str> = sha256_hex(&format!("{issuer}|{scope}")).into();
		let now = unix_now()?;

		if let Some(token) = self.lookup(&key, now) {
			return Ok(token);
		}

		let lock = self.refresh_lock(&key);
		let _guard = lock.lock().await;

		// Another task may have refreshed while we waited for the lock
		let now = unix_now()?;
		if let Some(token) = self.lookup(&key, now) {
			return Ok(token);
		}

		debug!(issuer, scope, "refreshing provider token");
		let fresh = refresh().await?;
		let token: Arc<str> = Arc::from(fresh.token);
		let lifetime = MIN_LIFETIME.max(fresh.expires_in - LIFETIME_MARGIN);
		let entry = Entry { token: Arc::clone(&token), expires_at: now + lifetime };
		if let Ok(mut entries) = self.entries.lock() {
			entries.insert(key, entry);
		}
		Ok(token)
	}

	fn lookup(&self, key: &str, now: i64) -> Option<Arc<str>> {
		let entries = self.entries.lock().ok()?;
		let entry = entries.get(key)?;
		(entry.expires_at > now + EXPIRY_SLACK).then(|| Arc::clone(&entry.token))
	}

	fn refresh_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
		match self.refresh_locks.lock() {
			Ok(mut locks) => Arc::clone(locks.entry(key.into()).or_default()),
			// Poisoned lock map degrades to a fresh, unshared lock
			Err(_) => Arc::default(),
		}
	}
}

fn unix_now() -> NvResult<i64> {
	let secs = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map_err(|_| Error::Internal("system clock before unix epoch".into()))?
		.as_secs();
	Ok(secs as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn fresh(token: &str, expires_in: i64) -> NvResult<FreshToken> {
		Ok(FreshToken { token: token.into(), expires_in })
	}

	#[tokio::test]
	async fn mints_then_serves_from_cache() {
		let cache = TokenCache::new();
		let calls = AtomicUsize::new(0);

		let token = cache
			.get_or_refresh("acct@example.iam", "scope-a", || async {
				calls.fetch_add(1, Ordering::SeqCst);
				fresh("tok-1", 3600)
			})
			.await
			.unwrap();
		assert_eq!(&*token, "tok-1");

		let token = cache
			.get_or_refresh("acct@example.iam", "scope-a", || async {
				calls.fetch_add(1, Ordering::SeqCst);
				fresh("tok-2", 3600)
			})
			.await
			.unwrap();
		assert_eq!(&*token, "tok-1");
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn scope_is_part_of_the_key() {
		let cache = TokenCache::new();
		let first = cache
			.get_or_refresh("acct@example.iam", "scope-a", || async { fresh("tok-a", 3600) })
			.await
			.unwrap();
		let second = cache
			.get_or_refresh("acct@example.iam", "scope-b", || async { fresh("tok-b", 3600) })
			.await
			.unwrap();
		assert_eq!(&*first, "tok-a");
		assert_eq!(&*second, "tok-b");
	}

	#[tokio::test]
	async fn short_lived_token_is_refreshed() {
		let cache = TokenCache::new();
		// expires_in 60 stores a 60s floor lifetime, but force staleness
		// by rewriting the entry to the past
		let _ = cache
			.get_or_refresh("acct@example.iam", "scope-a", || async { fresh("tok-old", 60) })
			.await
			.unwrap();
		{
			let mut entries = cache.entries.lock().unwrap();
			for entry in entries.values_mut() {
				entry.expires_at = 0;
			}
		}
		let token = cache
			.get_or_refresh("acct@example.iam", "scope-a", || async { fresh("tok-new", 3600) })
			.await
			.unwrap();
		assert_eq!(&*token, "tok-new");
	}

	#[tokio::test]
	async fn concurrent_callers_coalesce_into_one_refresh() {
		let cache = Arc::new(TokenCache::new());
		let calls = Arc::new(AtomicUsize::new(0));

		let mut handles = Vec::new();
		for _ in 0..4 {
			let cache = Arc::clone(&cache);
			let calls = Arc::clone(&calls);
			handles.push(tokio::spawn(async move {
				cache
					.get_or_refresh("acct@example.iam", "scope-a", || async move {
						calls.fetch_add(1, Ordering::SeqCst);
						// Hold the refresh open so the other tasks pile up on it
						tokio::time::sleep(std::time::Duration::from_millis(50)).await;
						fresh("tok-shared", 3600)
					})
					.await
			}));
		}
		for handle in handles {
			let token = handle.await.unwrap().unwrap();
			assert_eq!(&*token, "tok-shared");
		}
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn refresh_error_propagates_and_caches_nothing() {
		let cache = TokenCache::new();
		let result = cache
			.get_or_refresh("acct@example.iam", "scope-a", || async {
				Err(Error::Transport("oauth endpoint unreachable".into()))
			})
			.await;
		assert!(result.is_err());

		let token = cache
			.get_or_refresh("acct@example.iam", "scope-a", || async { fresh("tok-1", 3600) })
			.await
			.unwrap();
		assert_eq!(&*token, "tok-1");
	}
}

// vim: ts=4
