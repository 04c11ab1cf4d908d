//! Delivery target resolution
//!
//! Callers route a notification as loose JSON, either a bare string
//! (treated as a single FCM token, for callers predating multi-provider
//! routing) or a map of provider name to tokens/subscriptions:
//!
//! ```json
//! {
//!     "fcm": ["token-a", "token-b"],
//!     "apns": "token-c",
//!     "webpush": [{ "endpoint": "...", "keys": { "p256dh": "...", "auth": "..." } }]
//! }
//! ```
//!
//! [`parse_targets`] turns that into typed [`DeliveryTarget`]s, dropping
//! malformed entries with a warning rather than failing the dispatch.

use serde_json::Value;

use crate::prelude::*;
use notiva_types::types::Subscription;

pub fn parse_targets(route: &Value) -> Vec<DeliveryTarget> {
	match route {
		Value::String(token) if !token.is_empty() => {
			vec![DeliveryTarget::Fcm { tokens: vec![token.as_str().into()] }]
		}
		Value::Object(map) => {
			let mut targets = Vec::new();
			for (key, value) in map {
				match key.parse::<Provider>() {
					Ok(Provider::Fcm) => {
						let tokens = parse_tokens(value);
						if !tokens.is_empty() {
							targets.push(DeliveryTarget::Fcm { tokens });
						}
					}
					Ok(Provider::Apns) => {
						let tokens = parse_tokens(value);
						if !tokens.is_empty() {
							targets.push(DeliveryTarget::Apns { tokens });
						}
					}
					Ok(Provider::WebPush) => {
						let subscriptions = parse_subscriptions(value);
						if !subscriptions.is_empty() {
							targets.push(DeliveryTarget::WebPush { subscriptions });
						}
					}
					Err(_) => warn!(provider = %key, "unknown provider in push route, skipping"),
				}
			}
			targets
		}
		_ => Vec::new(),
	}
}

/// Accepts a bare token string, an array of token strings, or the
/// `{"token": ...}` wrapper shape.
fn parse_tokens(value: &Value) -> Vec<Box<str>> {
	let value = match value {
		Value::Object(map) => map.get("token").unwrap_or(value),
		_ => value,
	};
	match value {
		Value::String(token) if !token.is_empty() => vec![token.as_str().into()],
		Value::Array(items) => items
			.iter()
			.filter_map(Value::as_str)
			.filter(|token| !token.is_empty())
			.map(Into::into)
			.collect(),
		_ => Vec::new(),
	}
}

fn parse_subscriptions(value: &Value) -> Vec<Subscription> {
	let items = match value {
		Value::Array(items) => items.as_slice(),
		Value::Object(_) => std::slice::from_ref(value),
		_ => return Vec::new(),
	};
	items
		.iter()
		.filter_map(|item| match serde_json::from_value::<Subscription>(item.clone()) {
			Ok(sub) if !sub.endpoint.is_empty() => Some(sub),
			_ => {
				warn!("invalid web push subscription format, skipping");
				None
			}
		})
		.collect()
}


// vim: ts=4
