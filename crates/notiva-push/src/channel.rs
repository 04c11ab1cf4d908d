//! Dispatch orchestrator
//!
//! [`PushChannel`] owns one adapter per configured provider and fans a
//! notification out to every target the recipient routes to. Providers
//! are tried in the configured order; a failure in one never stops the
//! others, and the overall result is true if at least one delivery
//! went out.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::formatter::{self, Payload};
use crate::prelude::*;
use crate::{apns, fcm, webpush};

/// Provider-level failure. These never escape the channel as errors;
/// they are logged and folded into the boolean dispatch outcome.
#[derive(Debug)]
pub enum SendError {
	/// Credentials missing or unusable
	Config(Box<str>),
	/// Network failure or timeout
	Transport(Box<str>),
	/// Provider answered with a non-success status
	Rejected { status: u16, body: Box<str> },
}

impl std::fmt::Display for SendError {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			SendError::Config(msg) => write!(f, "configuration: {msg}"),
			SendError::Transport(msg) => write!(f, "transport: {msg}"),
			SendError::Rejected { status, body } => write!(f, "rejected ({status}): {body}"),
		}
	}
}

impl From<Error> for SendError {
	fn from(err: Error) -> Self {
		match err {
			Error::Config(msg) => SendError::Config(msg),
			Error::Transport(msg) => SendError::Transport(msg),
			other => SendError::Transport(other.to_string().into()),
		}
	}
}

/// One push provider behind the channel.
///
/// `send` returns whether at least one delivery in the target reached
/// the provider successfully; per-token failures are logged inside the
/// adapter and folded into the boolean.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
	fn provider(&self) -> Provider;
	async fn send(&self, target: &DeliveryTarget, payload: &Payload) -> Result<bool, SendError>;
}

pub struct PushChannel {
	order: Vec<Provider>,
	adapters: Vec<Arc<dyn ProviderAdapter>>,
	track_delivery: bool,
	debug: bool,
}

impl PushChannel {
	/// Build the channel from app config, instantiating an adapter for
	/// every enabled driver whose credentials are complete. Drivers with
	/// incomplete credentials are skipped with a warning so the rest of
	/// the channel stays usable.
	pub fn new(app: &App) -> Self {
		let config = &app.config;
		let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

		if config.drivers.fcm.enabled {
			match fcm::FcmAdapter::new(&config.drivers.fcm, Arc::clone(&app.token_cache)) {
				Ok(adapter) => adapters.push(Arc::new(adapter)),
				Err(err) => warn!(error = %err, "FCM driver disabled"),
			}
		}
		if config.drivers.apns.enabled {
			match apns::ApnsAdapter::new(&config.drivers.apns, Arc::clone(&app.token_cache)) {
				Ok(adapter) => adapters.push(Arc::new(adapter)),
				Err(err) => warn!(error = %err, "APNs driver disabled"),
			}
		}
		if config.drivers.webpush.enabled {
			match webpush::WebPushAdapter::new(&config.drivers.webpush) {
				Ok(adapter) => adapters.push(Arc::new(adapter)),
				Err(err) => warn!(error = %err, "Web Push driver disabled"),
			}
		}

		Self {
			order: config.default_order.clone(),
			adapters,
			track_delivery: config.features.track_delivery,
			debug: config.features.debug,
		}
	}

	/// Test seam: build a channel over arbitrary adapters.
	pub fn with_adapters(order: Vec<Provider>, adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
		Self { order, adapters, track_delivery: false, debug: false }
	}

	/// True if at least one provider adapter is usable.
	pub fn is_available(&self) -> bool {
		!self.adapters.is_empty()
	}

	/// Providers the channel can currently deliver through.
	pub fn available_providers(&self) -> Vec<Provider> {
		self.adapters.iter().map(|a| a.provider()).collect()
	}

	/// Dispatch a notification to all of a recipient's targets.
	///
	/// Providers run in the configured order and every matching target
	/// is attempted. Returns true if any delivery succeeded.
	pub async fn send(
		&self,
		recipient: &str,
		targets: &[DeliveryTarget],
		data: &Map<String, Value>,
	) -> bool {
		if targets.is_empty() {
			return false;
		}
		let payload = formatter::format(data);
		if self.debug {
			debug!(recipient, title = %payload.title, targets = targets.len(), "dispatching push");
		}

		let mut sent = false;
		let mut attempted = 0u32;
		for provider in &self.order {
			let Some(adapter) = self.adapters.iter().find(|a| a.provider() == *provider) else {
				continue;
			};
			for target in targets.iter().filter(|t| t.provider() == *provider && !t.is_empty()) {
				attempted += 1;
				match adapter.send(target, &payload).await {
					Ok(ok) => {
						if self.debug {
							debug!(recipient, provider = %provider, success = ok, "provider attempt");
						}
						sent = sent || ok;
					}
					Err(err) => {
						error!(recipient, provider = %provider, error = %err, "push send failed");
					}
				}
			}
		}

		if self.track_delivery {
			info!(recipient, attempted, delivered = sent, "push dispatch finished");
		}
		sent
	}
}

/// Shorten a device token for log output
pub(crate) fn redact(token: &str) -> &str {
	token.get(..8).unwrap_or(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use serde_json::json;
	use std::sync::atomic::{AtomicU32, Ordering};

	struct MockAdapter {
		provider: Provider,
		result: Result<bool, ()>,
		calls: AtomicU32,
	}

	impl MockAdapter {
		fn new(provider: Provider, result: Result<bool, ()>) -> Arc<Self> {
			Arc::new(Self { provider, result, calls: AtomicU32::new(0) })
		}
	}

	#[async_trait]
	impl ProviderAdapter for MockAdapter {
		fn provider(&self) -> Provider {
			self.provider
		}

		async fn send(&self, _: &DeliveryTarget, _: &Payload) -> Result<bool, SendError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.result.map_err(|()| SendError::Transport("mock failure".into()))
		}
	}

	fn fcm_target() -> DeliveryTarget {
		DeliveryTarget::Fcm { tokens: vec!["tok-fcm".into()] }
	}

	fn apns_target() -> DeliveryTarget {
		DeliveryTarget::Apns { tokens: vec!["tok-apns".into()] }
	}

	fn data() -> Map<String, Value> {
		json!({ "title": "Hello" }).as_object().cloned().unwrap()
	}

	#[tokio::test]
	async fn one_success_is_enough() {
		let failing = MockAdapter::new(Provider::Fcm, Err(()));
		let working = MockAdapter::new(Provider::Apns, Ok(true));
		let channel = PushChannel::with_adapters(
			vec![Provider::Fcm, Provider::Apns],
			vec![failing.clone() as Arc<dyn ProviderAdapter>, working.clone()],
		);

		let sent = channel.send("user-1", &[fcm_target(), apns_target()], &data()).await;
		assert!(sent);
		assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
		assert_eq!(working.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn success_does_not_short_circuit_later_providers() {
		let first = MockAdapter::new(Provider::Fcm, Ok(true));
		let second = MockAdapter::new(Provider::Apns, Ok(true));
		let channel = PushChannel::with_adapters(
			vec![Provider::Fcm, Provider::Apns],
			vec![first.clone() as Arc<dyn ProviderAdapter>, second.clone()],
		);

		assert!(channel.send("user-1", &[fcm_target(), apns_target()], &data()).await);
		assert_eq!(second.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn targets_without_adapter_are_skipped() {
		let fcm_only = MockAdapter::new(Provider::Fcm, Ok(true));
		let channel = PushChannel::with_adapters(
			vec![Provider::Fcm, Provider::Apns, Provider::WebPush],
			vec![fcm_only.clone() as Arc<dyn ProviderAdapter>],
		);

		assert!(channel.send("user-1", &[fcm_target(), apns_target()], &data()).await);
		assert_eq!(fcm_only.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn all_failures_report_not_sent() {
		let failing = MockAdapter::new(Provider::Fcm, Err(()));
		let rejected = MockAdapter::new(Provider::Apns, Ok(false));
		let channel = PushChannel::with_adapters(
			vec![Provider::Fcm, Provider::Apns],
			vec![failing as Arc<dyn ProviderAdapter>, rejected],
		);

		assert!(!channel.send("user-1", &[fcm_target(), apns_target()], &data()).await);
	}

	#[tokio::test]
	async fn empty_targets_never_touch_adapters() {
		let adapter = MockAdapter::new(Provider::Fcm, Ok(true));
		let channel =
			PushChannel::with_adapters(vec![Provider::Fcm], vec![adapter.clone() as Arc<dyn ProviderAdapter>]);

		assert!(!channel.send("user-1", &[], &data()).await);
		assert!(
			!channel
				.send("user-1", &[DeliveryTarget::Fcm { tokens: vec![] }], &data())
				.await
		);
		assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn redact_truncates_long_tokens() {
		assert_eq!(redact("abcdefghijkl"), "abcdefgh");
		assert_eq!(redact("short"), "short");
	}
}

// vim: ts=4
