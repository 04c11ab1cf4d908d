//! Payload normalization
//!
//! Raw notification data arrives as a loose JSON map. [`format`] pulls
//! out the display fields plus the per-provider delivery hints so the
//! provider adapters never touch the raw map. Custom key/value data
//! rides along under `data` and is delivered to the client untouched.

use serde_json::{Map, Value};

/// Normalized push payload shared by all provider adapters
#[derive(Debug, Clone, Default)]
pub struct Payload {
	pub title: String,
	pub body: String,
	pub image: Option<String>,
	pub icon: Option<String>,
	pub badge: Option<i64>,
	pub sound: String,
	/// Custom key/value payload passed through to the client
	pub data: Map<String, Value>,
	pub click_action: Option<String>,
	pub topic: Option<String>,
	pub color: Option<String>,
	pub tag: Option<String>,
	/// Android notification channel (`android_channel_id` wins over `channel_id`)
	pub channel_id: Option<String>,
	/// APNs category (`apns_category` wins over `category`)
	pub category: Option<String>,
	/// Android delivery priority: NORMAL or HIGH
	pub android_priority: Option<String>,
	/// APNs priority: 10 immediate, 5 background
	pub apns_priority: Option<i64>,
	pub apns_push_type: Option<String>,
	pub collapse_id: Option<String>,
	/// Lifetime in seconds (FCM android.ttl, Web Push TTL header)
	pub ttl: Option<i64>,
	/// Web Push urgency: very-low, low, normal, high
	pub urgency: Option<String>,
	pub renotify: Option<bool>,
	pub require_interaction: Option<bool>,
	/// Web Push notification actions: `[{action, title, icon}]`
	pub actions: Option<Value>,
}

/// Normalize raw notification data into a [`Payload`].
///
/// `title` falls back to `subject`, `body` to `message`; sound defaults
/// to `"default"`. Hint keys keep their raw-map spelling, including the
/// `android_channel_id`/`channel_id` and `apns_category`/`category`
/// fallback pairs.
pub fn format(data: &Map<String, Value>) -> Payload {
	Payload {
		title: get_str(data, "title").or_else(|| get_str(data, "subject")).unwrap_or_default(),
		body: get_str(data, "body").or_else(|| get_str(data, "message")).unwrap_or_default(),
		image: get_str(data, "image"),
		icon: get_str(data, "icon"),
		badge: get_i64(data, "badge"),
		sound: get_str(data, "sound").unwrap_or_else(|| "default".into()),
		data: data.get("data").and_then(Value::as_object).cloned().unwrap_or_default(),
		click_action: get_str(data, "click_action"),
		topic: get_str(data, "topic"),
		color: get_str(data, "color"),
		tag: get_str(data, "tag"),
		channel_id: get_str(data, "android_channel_id").or_else(|| get_str(data, "channel_id")),
		category: get_str(data, "apns_category").or_else(|| get_str(data, "category")),
		android_priority: get_str(data, "android_priority"),
		apns_priority: get_i64(data, "apns_priority"),
		apns_push_type: get_str(data, "apns_push_type"),
		collapse_id: get_str(data, "collapse_id"),
		ttl: get_i64(data, "ttl"),
		urgency: get_str(data, "urgency"),
		renotify: get_bool(data, "renotify"),
		require_interaction: get_bool(data, "requireInteraction"),
		actions: data.get("actions").filter(|v| v.is_array()).cloned(),
	}
}

fn get_str(data: &Map<String, Value>, key: &str) -> Option<String> {
	data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(Into::into)
}

fn get_i64(data: &Map<String, Value>, key: &str) -> Option<i64> {
	data.get(key).and_then(Value::as_i64)
}

fn get_bool(data: &Map<String, Value>, key: &str) -> Option<bool> {
	data.get(key).and_then(Value::as_bool)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use serde_json::json;

	fn map(value: Value) -> Map<String, Value> {
		value.as_object().cloned().unwrap()
	}

	#[test]
	fn title_and_body_fall_back_to_subject_and_message() {
		let payload = format(&map(json!({ "subject": "Hi", "message": "There" })));
		assert_eq!(payload.title, "Hi");
		assert_eq!(payload.body, "There");

		let payload = format(&map(json!({
			"title": "Direct", "subject": "Ignored",
			"body": "Direct body", "message": "Ignored"
		})));
		assert_eq!(payload.title, "Direct");
		assert_eq!(payload.body, "Direct body");
	}

	#[test]
	fn sound_defaults_and_data_passes_through() {
		let payload = format(&map(json!({ "data": { "order_id": "42" } })));
		assert_eq!(payload.sound, "default");
		assert_eq!(payload.data.get("order_id").unwrap(), "42");
		assert!(payload.title.is_empty());
	}

	#[test]
	fn channel_and_category_fallback_pairs() {
		let payload = format(&map(json!({
			"android_channel_id": "alerts", "channel_id": "shadowed",
			"apns_category": "MSG", "category": "shadowed"
		})));
		assert_eq!(payload.channel_id.as_deref(), Some("alerts"));
		assert_eq!(payload.category.as_deref(), Some("MSG"));

		let payload = format(&map(json!({ "channel_id": "plain", "category": "plain-cat" })));
		assert_eq!(payload.channel_id.as_deref(), Some("plain"));
		assert_eq!(payload.category.as_deref(), Some("plain-cat"));
	}

	#[test]
	fn delivery_hints_survive_normalization() {
		let payload = format(&map(json!({
			"ttl": 600, "urgency": "high", "apns_priority": 5,
			"requireInteraction": true, "actions": [{ "action": "open", "title": "Open" }]
		})));
		assert_eq!(payload.ttl, Some(600));
		assert_eq!(payload.urgency.as_deref(), Some("high"));
		assert_eq!(payload.apns_priority, Some(5));
		assert_eq!(payload.require_interaction, Some(true));
		assert!(payload.actions.is_some());
	}
}

// vim: ts=4
