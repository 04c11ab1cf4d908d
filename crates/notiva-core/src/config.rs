//! Engine configuration
//!
//! Mirrors the deployment surface: per-driver credential blocks, the
//! provider fallback order, and feature toggles. All fields have serde
//! defaults so a partial config file deserializes cleanly; `from_env`
//! builds the same tree from `NOTIVA_*` environment variables.

use serde::Deserialize;

use crate::prelude::*;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Provider order tried during dispatch. Every configured provider
	/// with a matching target is attempted; order only affects logging
	/// and which failure surfaces first.
	pub default_order: Vec<Provider>,
	pub drivers: Drivers,
	pub features: Features,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			default_order: vec![Provider::Fcm, Provider::Apns, Provider::WebPush],
			drivers: Drivers::default(),
			features: Features::default(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Drivers {
	pub fcm: FcmConfig,
	pub apns: ApnsConfig,
	pub webpush: WebPushConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FcmConfig {
	/// Drivers are enabled by default; a driver only becomes usable
	/// once its credentials are complete.
	pub enabled: bool,
	/// Service account credentials: a filesystem path to the JSON key
	/// file, or the raw JSON itself.
	pub credentials: Option<Box<str>>,
	/// Firebase project id. Optional when the credentials JSON carries
	/// `project_id`.
	pub project: Option<Box<str>>,
}

impl Default for FcmConfig {
	fn default() -> Self {
		Self { enabled: true, credentials: None, project: None }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApnsConfig {
	pub enabled: bool,
	pub key_id: Option<Box<str>>,
	pub team_id: Option<Box<str>>,
	pub app_bundle_id: Option<Box<str>>,
	/// Path to the .p8 signing key for token-based auth
	pub p8_path: Option<Box<str>>,
	/// Path to a PEM certificate bundle for certificate-based auth
	pub certificate: Option<Box<str>>,
	pub passphrase: Option<Box<str>>,
	pub sandbox: bool,
}

impl Default for ApnsConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			key_id: None,
			team_id: None,
			app_bundle_id: None,
			p8_path: None,
			certificate: None,
			passphrase: None,
			sandbox: true,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebPushConfig {
	pub enabled: bool,
	pub vapid: VapidConfig,
}

impl Default for WebPushConfig {
	fn default() -> Self {
		Self { enabled: true, vapid: VapidConfig::default() }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VapidConfig {
	/// Contact URI placed in the VAPID `sub` claim (mailto: or https:)
	pub subject: Option<Box<str>>,
	/// Uncompressed P-256 public key, base64url
	pub public_key: Option<Box<str>>,
	/// Raw 32-byte P-256 scalar, base64url
	pub private_key: Option<Box<str>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Features {
	/// Log a per-recipient delivery summary after each dispatch
	pub track_delivery: bool,
	/// Verbose dispatch logging, including provider responses
	pub debug: bool,
}

impl Config {
	pub fn from_env() -> Self {
		Self::from_env_with(|name| std::env::var(name).ok())
	}

	fn from_env_with(get: impl Fn(&str) -> Option<String>) -> Self {
		let env_opt =
			|name: &str| -> Option<Box<str>> { get(name).filter(|v| !v.is_empty()).map(Into::into) };
		let env_bool = |name: &str, default: bool| match get(name) {
			Some(val) => matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
			None => default,
		};

		let mut config = Config::default();

		if let Some(order) = env_opt("NOTIVA_PUSH_ORDER") {
			let parsed: Vec<Provider> =
				order.split(',').filter_map(|part| part.trim().parse().ok()).collect();
			if !parsed.is_empty() {
				config.default_order = parsed;
			}
		}

		config.drivers.fcm.enabled = env_bool("NOTIVA_FCM_ENABLED", true);
		config.drivers.fcm.credentials = env_opt("NOTIVA_FCM_CREDENTIALS");
		config.drivers.fcm.project = env_opt("NOTIVA_FCM_PROJECT");

		config.drivers.apns.enabled = env_bool("NOTIVA_APNS_ENABLED", true);
		config.drivers.apns.key_id = env_opt("NOTIVA_APNS_KEY_ID");
		config.drivers.apns.team_id = env_opt("NOTIVA_APNS_TEAM_ID");
		config.drivers.apns.app_bundle_id = env_opt("NOTIVA_APNS_BUNDLE_ID");
		config.drivers.apns.p8_path = env_opt("NOTIVA_APNS_P8_PATH");
		config.drivers.apns.certificate = env_opt("NOTIVA_APNS_CERT");
		config.drivers.apns.passphrase = env_opt("NOTIVA_APNS_PASSPHRASE");
		config.drivers.apns.sandbox = env_bool("NOTIVA_APNS_SANDBOX", true);

		config.drivers.webpush.enabled = env_bool("NOTIVA_WEBPUSH_ENABLED", true);
		config.drivers.webpush.vapid.subject = env_opt("NOTIVA_VAPID_SUBJECT");
		config.drivers.webpush.vapid.public_key = env_opt("NOTIVA_VAPID_PUBLIC_KEY");
		config.drivers.webpush.vapid.private_key = env_opt("NOTIVA_VAPID_PRIVATE_KEY");

		config.features.track_delivery = env_bool("NOTIVA_TRACK_DELIVERY", false);
		config.features.debug = env_bool("NOTIVA_DEBUG", false);

		config
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;

	#[test]
	fn default_order_covers_all_providers() {
		let config = Config::default();
		assert_eq!(
			config.default_order,
			vec![Provider::Fcm, Provider::Apns, Provider::WebPush]
		);
		assert!(config.drivers.apns.sandbox);
	}

	#[test]
	fn drivers_are_enabled_by_default() {
		let config = Config::default();
		assert!(config.drivers.fcm.enabled);
		assert!(config.drivers.apns.enabled);
		assert!(config.drivers.webpush.enabled);

		// env loading keeps the same defaults when nothing is set
		let config = Config::from_env_with(|_| None);
		assert!(config.drivers.fcm.enabled);
		assert!(config.drivers.apns.enabled);
		assert!(config.drivers.webpush.enabled);
	}

	#[test]
	fn env_variables_override_driver_settings() {
		let vars = std::collections::HashMap::from([
			("NOTIVA_FCM_ENABLED", "false"),
			("NOTIVA_APNS_CERT", "/etc/notiva/apns.pem"),
			("NOTIVA_VAPID_SUBJECT", "mailto:ops@example.org"),
			("NOTIVA_PUSH_ORDER", "webpush, fcm"),
		]);
		let config = Config::from_env_with(|name| vars.get(name).map(ToString::to_string));

		assert!(!config.drivers.fcm.enabled);
		assert_eq!(config.drivers.apns.certificate.as_deref(), Some("/etc/notiva/apns.pem"));
		assert_eq!(
			config.drivers.webpush.vapid.subject.as_deref(),
			Some("mailto:ops@example.org")
		);
		assert_eq!(config.default_order, vec![Provider::WebPush, Provider::Fcm]);
	}

	#[test]
	fn partial_json_deserializes_with_defaults() {
		let config: Config = serde_json::from_str(
			r#"{
				"default_order": ["webpush"],
				"drivers": { "fcm": { "enabled": true, "project": "demo-app" } }
			}"#,
		)
		.unwrap();
		assert_eq!(config.default_order, vec![Provider::WebPush]);
		assert!(config.drivers.fcm.enabled);
		assert_eq!(config.drivers.fcm.project.as_deref(), Some("demo-app"));
		assert!(config.drivers.webpush.enabled);
		assert!(config.drivers.apns.sandbox);
	}
}

// vim: ts=4
