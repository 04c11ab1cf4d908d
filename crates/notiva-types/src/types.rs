//! Core data model: providers, delivery targets, device records

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::prelude::*;

/// Unix timestamp in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

pub fn now() -> NvResult<Timestamp> {
	let secs = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map_err(|_| Error::Internal("system clock before unix epoch".into()))?
		.as_secs();
	Ok(Timestamp(secs as i64))
}

/// Push delivery provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
	Fcm,
	Apns,
	WebPush,
}

impl Provider {
	pub const ALL: [Provider; 3] = [Provider::Fcm, Provider::Apns, Provider::WebPush];

	pub fn as_str(self) -> &'static str {
		match self {
			Provider::Fcm => "fcm",
			Provider::Apns => "apns",
			Provider::WebPush => "webpush",
		}
	}
}

impl std::str::FromStr for Provider {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"fcm" => Ok(Provider::Fcm),
			"apns" => Ok(Provider::Apns),
			"webpush" => Ok(Provider::WebPush),
			_ => Err(Error::InvalidProvider(s.into())),
		}
	}
}

impl std::fmt::Display for Provider {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Device platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
	Android,
	Ios,
	Web,
}

impl Platform {
	pub fn as_str(self) -> &'static str {
		match self {
			Platform::Android => "android",
			Platform::Ios => "ios",
			Platform::Web => "web",
		}
	}
}

impl std::str::FromStr for Platform {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"android" => Ok(Platform::Android),
			"ios" => Ok(Platform::Ios),
			"web" => Ok(Platform::Web),
			_ => Err(Error::validation("platform", "Unknown platform")),
		}
	}
}

/// Device lifecycle status.
///
/// `active → invalid` when a newer token registers for the same owner
/// slot, `active|invalid → revoked` on soft unregister. Nothing leaves
/// `revoked` except re-registration creating a fresh `active` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
	Active,
	Invalid,
	Revoked,
}

impl DeviceStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			DeviceStatus::Active => "active",
			DeviceStatus::Invalid => "invalid",
			DeviceStatus::Revoked => "revoked",
		}
	}
}

impl std::str::FromStr for DeviceStatus {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"active" => Ok(DeviceStatus::Active),
			"invalid" => Ok(DeviceStatus::Invalid),
			"revoked" => Ok(DeviceStatus::Revoked),
			_ => Err(Error::Internal(format!("unknown device status: {s}"))),
		}
	}
}

/// Web Push subscription keys (base64url encoded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
	pub p256dh: Box<str>,
	pub auth: Box<str>,
}

/// Web Push subscription as produced by the browser's Push API
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
	pub endpoint: Box<str>,
	/// Expiration time from the browser, if any (Unix ms)
	#[serde(rename = "expirationTime", default)]
	pub expiration_time: Option<i64>,
	pub keys: SubscriptionKeys,
}

/// Per-provider delivery target, validated at the routing boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
	Fcm { tokens: Vec<Box<str>> },
	Apns { tokens: Vec<Box<str>> },
	WebPush { subscriptions: Vec<Subscription> },
}

impl DeliveryTarget {
	pub fn provider(&self) -> Provider {
		match self {
			DeliveryTarget::Fcm { .. } => Provider::Fcm,
			DeliveryTarget::Apns { .. } => Provider::Apns,
			DeliveryTarget::WebPush { .. } => Provider::WebPush,
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			DeliveryTarget::Fcm { tokens } | DeliveryTarget::Apns { tokens } => tokens.is_empty(),
			DeliveryTarget::WebPush { subscriptions } => subscriptions.is_empty(),
		}
	}
}

/// Device registration record as handed to the storage adapter.
///
/// Timestamps are assigned by the adapter when the record is written.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
	pub uuid: Box<str>,
	pub user_uuid: Box<str>,
	pub notifiable_type: Option<Box<str>>,
	pub notifiable_id: Option<Box<str>>,
	pub provider: Provider,
	pub platform: Option<Platform>,
	pub device_token: Box<str>,
	pub subscription_json: Option<Box<str>>,
	pub device_id: Option<Box<str>>,
	pub app_id: Option<Box<str>>,
	pub bundle_id: Option<Box<str>>,
	pub locale: Option<Box<str>>,
	pub timezone: Option<Box<str>>,
}

/// Projection returned by device listing. Excludes `subscription_json`
/// and internal row ids.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct DeviceView {
	pub uuid: Box<str>,
	pub provider: Provider,
	pub platform: Option<Platform>,
	pub device_id: Option<Box<str>>,
	pub device_token: Option<Box<str>>,
	pub status: DeviceStatus,
	pub registered_at: Option<Timestamp>,
	pub last_seen_at: Option<Timestamp>,
	pub invalidated_at: Option<Timestamp>,
	pub app_id: Option<Box<str>>,
	pub bundle_id: Option<Box<str>>,
	pub locale: Option<Box<str>>,
	pub timezone: Option<Box<str>>,
}

/// Filters for device listing
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDeviceOptions {
	pub provider: Option<Provider>,
	pub platform: Option<Platform>,
}

/// Identifies a device row for unregistration, scoped to a user.
#[derive(Debug, Clone)]
pub enum DeviceSelector {
	Uuid(Box<str>),
	Token { provider: Provider, device_token: Box<str> },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;

	#[test]
	fn provider_parses_case_insensitively() {
		assert_eq!("FCM".parse::<Provider>().unwrap(), Provider::Fcm);
		assert_eq!("WebPush".parse::<Provider>().unwrap(), Provider::WebPush);
		assert!("gcm".parse::<Provider>().is_err());
	}

	#[test]
	fn provider_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&Provider::WebPush).unwrap(), "\"webpush\"");
		assert_eq!(serde_json::to_string(&Platform::Ios).unwrap(), "\"ios\"");
	}

	#[test]
	fn delivery_target_emptiness() {
		let target = DeliveryTarget::Fcm { tokens: vec![] };
		assert!(target.is_empty());
		let target = DeliveryTarget::Apns { tokens: vec!["tok".into()] };
		assert!(!target.is_empty());
		assert_eq!(target.provider(), Provider::Apns);
	}
}

// vim: ts=4
