//! Web Push delivery
//!
//! Implements RFC 8030 (HTTP/2 Push), RFC 8188 (Encrypted Content-Encoding),
//! RFC 8291 (Message Encryption for Web Push), and RFC 8292 (VAPID).
//!
//! The display payload is encrypted per subscription with aes128gcm and
//! posted straight to the browser's push endpoint, authenticated with a
//! VAPID JWT scoped to the endpoint origin.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use http_body_util::Full;
use hyper::body::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::channel::{ProviderAdapter, SendError};
use crate::formatter::Payload;
use crate::prelude::*;
use notiva_core::config::WebPushConfig;
use notiva_core::http::{self, HttpsClient};
use notiva_types::types::Subscription;

/// Default notification lifetime: 28 days
const DEFAULT_TTL: i64 = 2_419_200;
/// VAPID tokens are minted per send with a 12 hour lifetime
const VAPID_TTL: u64 = 12 * 3600;

const URGENCIES: [&str; 4] = ["very-low", "low", "normal", "high"];

pub struct WebPushAdapter {
	subject: Box<str>,
	public_key: Box<str>,
	/// PKCS#8 PEM derived from the raw VAPID scalar at construction
	private_key_pem: Box<str>,
	client: HttpsClient,
}

impl WebPushAdapter {
	pub fn new(config: &WebPushConfig) -> NvResult<Self> {
		let vapid = &config.vapid;
		let (Some(subject), Some(public_key), Some(private_key)) =
			(vapid.subject.clone(), vapid.public_key.clone(), vapid.private_key.as_deref())
		else {
			return Err(Error::Config(
				"VAPID configuration missing: subject, public_key and private_key are required"
					.into(),
			));
		};

		let private_key_pem = vapid_key_pem(private_key)?;
		Ok(Self { subject, public_key, private_key_pem, client: http::client_h2()? })
	}

	/// Browser-side notification payload; the service worker handles display.
	fn display_payload(payload: &Payload) -> Value {
		let mut body = Map::new();
		body.insert("title".into(), payload.title.as_str().into());
		body.insert("body".into(), payload.body.as_str().into());
		insert_opt(&mut body, "icon", payload.icon.as_deref().map(Into::into));
		insert_opt(&mut body, "image", payload.image.as_deref().map(Into::into));
		insert_opt(&mut body, "badge", payload.badge.map(Into::into));
		body.insert("data".into(), payload.data.clone().into());
		insert_opt(&mut body, "tag", payload.tag.as_deref().map(Into::into));
		insert_opt(&mut body, "renotify", payload.renotify.map(Into::into));
		insert_opt(
			&mut body,
			"requireInteraction",
			payload.require_interaction.map(Into::into),
		);
		insert_opt(&mut body, "actions", payload.actions.clone());
		body.into()
	}

	fn create_vapid_jwt(&self, endpoint: &str) -> NvResult<String> {
		use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

		#[derive(Serialize)]
		struct VapidClaims<'a> {
			aud: String,
			exp: u64,
			sub: &'a str,
		}

		let exp = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|_| Error::Internal("system clock before unix epoch".into()))?
			.as_secs() + VAPID_TTL;
		let claims =
			VapidClaims { aud: endpoint_audience(endpoint)?, exp, sub: &self.subject };

		let encoding_key = EncodingKey::from_ec_pem(self.private_key_pem.as_bytes())
			.map_err(|err| Error::Config(format!("invalid VAPID private key: {err}").into()))?;
		encode(&Header::new(Algorithm::ES256), &claims, &encoding_key)
			.map_err(|err| Error::Config(format!("VAPID JWT encoding failed: {err}").into()))
	}

	async fn send_one(&self, subscription: &Subscription, body: &str, ttl: i64, urgency: Option<&str>) -> NvResult<bool> {
		let encrypted =
			encrypt_payload(body, &subscription.keys.p256dh, &subscription.keys.auth)?;
		let vapid_jwt = self.create_vapid_jwt(&subscription.endpoint)?;

		let mut builder = hyper::Request::builder()
			.method(hyper::Method::POST)
			.uri(subscription.endpoint.as_ref())
			.header("Content-Type", "application/octet-stream")
			.header("Content-Encoding", "aes128gcm")
			.header("TTL", ttl.to_string())
			.header(
				"Authorization",
				format!("vapid t={},k={}", vapid_jwt, self.public_key),
			);
		if let Some(urgency) = urgency {
			builder = builder.header("Urgency", urgency);
		}
		let request = builder
			.body(Full::new(Bytes::from(encrypted)))
			.map_err(|err| Error::Transport(format!("request build failed: {err}").into()))?;

		let (status, response) = http::send(&self.client, request).await?;
		if status.is_success() {
			return Ok(true);
		}
		if status == hyper::StatusCode::GONE || status == hyper::StatusCode::NOT_FOUND {
			warn!(endpoint = %subscription.endpoint, "web push subscription expired");
		} else {
			warn!(
				status = %status,
				endpoint = %subscription.endpoint,
				body = %String::from_utf8_lossy(&response),
				"web push delivery failed"
			);
		}
		Ok(false)
	}
}

#[async_trait]
impl ProviderAdapter for WebPushAdapter {
	fn provider(&self) -> Provider {
		Provider::WebPush
	}

	async fn send(&self, target: &DeliveryTarget, payload: &Payload) -> Result<bool, SendError> {
		let DeliveryTarget::WebPush { subscriptions } = target else {
			return Ok(false);
		};

		let body = serde_json::to_string(&Self::display_payload(payload))
			.map_err(|err| SendError::Transport(format!("serialize failed: {err}").into()))?;
		let ttl = payload.ttl.unwrap_or(DEFAULT_TTL);
		let urgency = payload
			.urgency
			.as_deref()
			.filter(|u| URGENCIES.contains(u));

		let mut sent_any = false;
		for subscription in subscriptions {
			if subscription.keys.p256dh.is_empty() || subscription.keys.auth.is_empty() {
				warn!(endpoint = %subscription.endpoint, "invalid web push subscription, skipping");
				continue;
			}
			match self.send_one(subscription, &body, ttl, urgency).await {
				Ok(ok) => sent_any = sent_any || ok,
				Err(err) => {
					warn!(endpoint = %subscription.endpoint, error = %err, "web push send error");
				}
			}
		}
		Ok(sent_any)
	}
}

/// Encrypt the payload for one subscription (RFC 8188, 8291).
///
/// The aes128gcm output already carries salt and sender public key in
/// its header, so the ciphertext is the whole request body.
fn encrypt_payload(payload: &str, p256dh_base64: &str, auth_base64: &str) -> NvResult<Vec<u8>> {
	let p256dh = URL_SAFE_NO_PAD
		.decode(p256dh_base64)
		.map_err(|err| Error::Transport(format!("invalid p256dh key: {err}").into()))?;
	let auth = URL_SAFE_NO_PAD
		.decode(auth_base64)
		.map_err(|err| Error::Transport(format!("invalid auth secret: {err}").into()))?;

	ece::encrypt(&p256dh, &auth, payload.as_bytes())
		.map_err(|err| Error::Transport(format!("payload encryption failed: {err:?}").into()))
}

/// Convert the raw 32-byte VAPID scalar (base64url) into PKCS#8 PEM
/// for the JWT signer.
fn vapid_key_pem(private_key_raw: &str) -> NvResult<Box<str>> {
	use p256::pkcs8::{EncodePrivateKey, LineEnding};

	let private_key_bytes = URL_SAFE_NO_PAD
		.decode(private_key_raw)
		.map_err(|err| Error::Config(format!("invalid base64url VAPID key: {err}").into()))?;
	if private_key_bytes.len() != 32 {
		return Err(Error::Config("VAPID private key must be a 32-byte P-256 scalar".into()));
	}
	let secret_key = p256::SecretKey::from_bytes(private_key_bytes.as_slice().into())
		.map_err(|err| Error::Config(format!("invalid P-256 VAPID key: {err:?}").into()))?;
	let pem = secret_key
		.to_pkcs8_pem(LineEnding::LF)
		.map_err(|err| Error::Config(format!("VAPID key encoding failed: {err:?}").into()))?;
	Ok(pem.as_str().into())
}

/// VAPID audience: the push endpoint's origin
fn endpoint_audience(endpoint: &str) -> NvResult<String> {
	let url = url::Url::parse(endpoint)
		.map_err(|err| Error::Transport(format!("invalid endpoint URL: {err}").into()))?;
	let host = url
		.host_str()
		.ok_or_else(|| Error::Transport("endpoint URL has no host".into()))?;
	Ok(format!("{}://{}", url.scheme(), host))
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
	if let Some(value) = value {
		map.insert(key.into(), value);
	}
}


// vim: ts=4
