//! Apple Push Notification service
//!
//! Speaks the APNs HTTP/2 provider API directly. Two auth modes:
//! token-based (ES256 provider JWT signed with a .p8 key, cached and
//! reused across connections) and certificate-based (client TLS cert
//! presented during the handshake). Sandbox and production hosts are
//! selected by configuration.

use async_trait::async_trait;
use http_body_util::Full;
use hyper::body::Bytes;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::channel::{ProviderAdapter, SendError, redact};
use crate::formatter::Payload;
use crate::prelude::*;
use notiva_core::config::ApnsConfig;
use notiva_core::http::{self, HttpsClient};
use notiva_core::token_cache::{FreshToken, TokenCache};

const PRODUCTION_HOST: &str = "api.push.apple.com";
const SANDBOX_HOST: &str = "api.sandbox.push.apple.com";
/// Apple rejects provider tokens older than an hour; refresh at 50 minutes
const PROVIDER_TOKEN_TTL: i64 = 3000;

enum ApnsAuth {
	Token { key_id: Box<str>, team_id: Box<str>, signing_key: EncodingKey },
	Certificate,
}

pub struct ApnsAdapter {
	host: &'static str,
	bundle_id: Box<str>,
	auth: ApnsAuth,
	token_cache: Arc<TokenCache>,
	client: HttpsClient,
}

impl ApnsAdapter {
	pub fn new(config: &ApnsConfig, token_cache: Arc<TokenCache>) -> NvResult<Self> {
		let host = if config.sandbox { SANDBOX_HOST } else { PRODUCTION_HOST };
		let bundle_id = config.app_bundle_id.clone().unwrap_or_default();

		let using_token = config.p8_path.is_some()
			&& config.key_id.is_some()
			&& config.team_id.is_some()
			&& !bundle_id.is_empty();

		if using_token {
			let (Some(p8_path), Some(key_id), Some(team_id)) =
				(config.p8_path.as_deref(), config.key_id.clone(), config.team_id.clone())
			else {
				return Err(Error::Config("APNs token auth fields missing".into()));
			};
			let pem = std::fs::read(p8_path)
				.map_err(|err| Error::Config(format!("cannot read APNs .p8 key: {err}").into()))?;
			let signing_key = EncodingKey::from_ec_pem(&pem)
				.map_err(|err| Error::Config(format!("invalid APNs .p8 key: {err}").into()))?;
			Ok(Self {
				host,
				bundle_id,
				auth: ApnsAuth::Token { key_id, team_id, signing_key },
				token_cache,
				client: http::client_h2()?,
			})
		} else if let Some(certificate) = config.certificate.as_deref() {
			if config.passphrase.is_some() {
				return Err(Error::Config(
					"encrypted APNs certificates are not supported, provide an unencrypted PEM"
						.into(),
				));
			}
			let client = http::client_h2_with_tls(client_cert_tls(certificate)?);
			Ok(Self { host, bundle_id, auth: ApnsAuth::Certificate, token_cache, client })
		} else {
			Err(Error::Config(
				"APNs configuration incomplete: provide token auth (p8_path, key_id, team_id, app_bundle_id) or a certificate"
					.into(),
			))
		}
	}

	async fn provider_token(&self) -> NvResult<Option<Arc<str>>> {
		let ApnsAuth::Token { key_id, team_id, signing_key } = &self.auth else {
			return Ok(None);
		};
		let issuer = format!("{team_id}:{key_id}");
		let token = self
			.token_cache
			.get_or_refresh(&issuer, "apns", || async {
				#[derive(Serialize)]
				struct Claims<'a> {
					iss: &'a str,
					iat: i64,
				}

				let mut header = Header::new(Algorithm::ES256);
				header.kid = Some(key_id.to_string());
				let claims = Claims { iss: team_id, iat: unix_now()? };
				let jwt = encode(&header, &claims, signing_key).map_err(|err| {
					Error::Config(format!("APNs provider token signing failed: {err}").into())
				})?;
				Ok(FreshToken { token: jwt.into(), expires_in: PROVIDER_TOKEN_TTL })
			})
			.await?;
		Ok(Some(token))
	}

	/// Build the APNs request body: the `aps` dictionary plus the custom
	/// data payload under `data`.
	fn build_body(payload: &Payload) -> Value {
		let mut alert = Map::new();
		if !payload.title.is_empty() {
			alert.insert("title".into(), payload.title.as_str().into());
		}
		if !payload.body.is_empty() {
			alert.insert("body".into(), payload.body.as_str().into());
		}

		let mut aps = Map::new();
		if !alert.is_empty() {
			aps.insert("alert".into(), alert.into());
		}
		if !payload.sound.is_empty() {
			aps.insert("sound".into(), payload.sound.as_str().into());
		}
		if let Some(badge) = payload.badge {
			aps.insert("badge".into(), badge.into());
		}
		if let Some(category) = payload.category.as_deref() {
			aps.insert("category".into(), category.into());
		}

		let mut body = Map::new();
		body.insert("aps".into(), aps.into());
		if !payload.data.is_empty() {
			body.insert("data".into(), payload.data.clone().into());
		}
		body.into()
	}

	/// Delivery priority: only 5 (background) and 10 (immediate) are
	/// valid; anything else is coerced to 10.
	fn priority(payload: &Payload) -> i64 {
		match payload.apns_priority {
			Some(5) => 5,
			_ => 10,
		}
	}
}

#[async_trait]
impl ProviderAdapter for ApnsAdapter {
	fn provider(&self) -> Provider {
		Provider::Apns
	}

	async fn send(&self, target: &DeliveryTarget, payload: &Payload) -> Result<bool, SendError> {
		let DeliveryTarget::Apns { tokens } = target else {
			return Ok(false);
		};

		let provider_token = self.provider_token().await?;
		let body = serde_json::to_vec(&Self::build_body(payload))
			.map_err(|err| SendError::Transport(format!("serialize failed: {err}").into()))?;
		let push_type = payload.apns_push_type.as_deref().unwrap_or("alert");
		let priority = Self::priority(payload);

		let mut sent_any = false;
		for token in tokens {
			let mut builder = hyper::Request::builder()
				.method(hyper::Method::POST)
				.uri(format!("https://{}/3/device/{}", self.host, token))
				.header("apns-push-type", push_type)
				.header("apns-priority", priority.to_string())
				.header("Content-Type", "application/json");
			if !self.bundle_id.is_empty() {
				builder = builder.header("apns-topic", self.bundle_id.as_ref());
			}
			if let Some(collapse_id) = payload.collapse_id.as_deref() {
				builder = builder.header("apns-collapse-id", collapse_id);
			}
			if let Some(provider_token) = provider_token.as_deref() {
				builder = builder.header("Authorization", format!("bearer {provider_token}"));
			}
			let request = builder
				.body(Full::new(Bytes::copy_from_slice(&body)))
				.map_err(|err| SendError::Transport(format!("request build failed: {err}").into()))?;

			match http::send(&self.client, request).await {
				Ok((status, _)) if status.is_success() => sent_any = true,
				Ok((status, response)) if status == hyper::StatusCode::GONE => {
					warn!(
						token = redact(token),
						body = %String::from_utf8_lossy(&response),
						"APNs token no longer valid"
					);
				}
				Ok((status, response)) => {
					warn!(
						status = %status,
						token = redact(token),
						body = %String::from_utf8_lossy(&response),
						"APNs delivery failed"
					);
				}
				Err(err) => {
					warn!(token = redact(token), error = %err, "APNs request error");
				}
			}
		}
		Ok(sent_any)
	}
}

/// TLS config presenting the APNs client certificate during the handshake
fn client_cert_tls(certificate_path: &str) -> NvResult<rustls::ClientConfig> {
	let pem = std::fs::read(certificate_path)
		.map_err(|err| Error::Config(format!("cannot read APNs certificate: {err}").into()))?;

	let certs = rustls_pemfile::certs(&mut pem.as_slice())
		.collect::<Result<Vec<_>, _>>()
		.map_err(|err| Error::Config(format!("invalid APNs certificate: {err}").into()))?;
	if certs.is_empty() {
		return Err(Error::Config("APNs certificate PEM contains no certificates".into()));
	}
	let key = rustls_pemfile::private_key(&mut pem.as_slice())
		.map_err(|err| Error::Config(format!("invalid APNs private key: {err}").into()))?
		.ok_or_else(|| Error::Config("APNs certificate PEM contains no private key".into()))?;

	let mut roots = rustls::RootCertStore::empty();
	roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

	rustls::ClientConfig::builder()
		.with_root_certificates(roots)
		.with_client_auth_cert(certs, key)
		.map_err(|err| Error::Config(format!("APNs client cert rejected: {err}").into()))
}

fn unix_now() -> NvResult<i64> {
	let secs = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map_err(|_| Error::Internal("system clock before unix epoch".into()))?
		.as_secs();
	Ok(secs as i64)
}


// vim: ts=4
