//! Device registry
//!
//! Registration, listing, and unregistration of push devices on top of
//! the pluggable [`DeviceAdapter`]. Validation happens here; token
//! rotation and upsert mechanics live in the adapter.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::prelude::*;
use notiva_types::device_adapter::DeviceAdapter;
use notiva_types::types::{
	DeviceRecord, DeviceSelector, DeviceView, ListDeviceOptions, Subscription,
};
use notiva_types::utils::{DEVICE_ID_LENGTH, random_id, webpush_token};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
	pub provider: Option<Box<str>>,
	pub platform: Option<Box<str>>,
	pub device_token: Option<Box<str>>,
	/// Web Push subscription; required when provider is webpush
	pub subscription: Option<Subscription>,
	pub device_id: Option<Box<str>>,
	pub app_id: Option<Box<str>>,
	pub bundle_id: Option<Box<str>>,
	pub locale: Option<Box<str>>,
	pub timezone: Option<Box<str>>,
	pub notifiable_type: Option<Box<str>>,
	pub notifiable_id: Option<Box<str>>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
	pub affected: u64,
	pub uuid: Box<str>,
	pub provider: Provider,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub platform: Option<Platform>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
	pub provider: Option<Box<str>>,
	pub platform: Option<Box<str>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnregisterRequest {
	pub uuid: Option<Box<str>>,
	pub provider: Option<Box<str>>,
	pub device_token: Option<Box<str>>,
	/// Delete the row instead of revoking it
	#[serde(default)]
	pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct UnregisterResponse {
	pub affected: u64,
	pub action: &'static str,
}

pub struct DeviceRegistry {
	adapter: Arc<dyn DeviceAdapter>,
}

impl DeviceRegistry {
	pub fn new(adapter: Arc<dyn DeviceAdapter>) -> Self {
		Self { adapter }
	}

	/// Register or refresh a device for a user.
	///
	/// Web Push registrations derive their device token from the
	/// subscription endpoint hash, so re-subscribing the same endpoint
	/// updates the existing row. Tokens for the same user/provider slot
	/// are rotated out by the adapter.
	pub async fn register(
		&self,
		user_uuid: &str,
		request: RegisterRequest,
	) -> NvResult<RegisterResponse> {
		if user_uuid.is_empty() {
			return Err(Error::validation("user_uuid", "User UUID is required"));
		}

		let provider: Provider = request.provider.as_deref().unwrap_or_default().parse()?;

		let platform = match request.platform.as_deref().filter(|p| !p.is_empty()) {
			Some(raw) => Some(raw.parse::<Platform>()?),
			None => None,
		};

		let (device_token, subscription_json) = if provider == Provider::WebPush {
			let subscription = request
				.subscription
				.as_ref()
				.filter(|sub| !sub.endpoint.is_empty())
				.ok_or_else(|| {
					Error::validation(
						"subscription",
						"Web Push subscription with endpoint is required",
					)
				})?;
			let json = serde_json::to_string(subscription)
				.map_err(|_| Error::validation("subscription", "Invalid subscription"))?;
			(webpush_token(&subscription.endpoint).into(), Some(json.into()))
		} else {
			let token = request
				.device_token
				.clone()
				.filter(|token| !token.is_empty())
				.ok_or_else(|| Error::validation("device_token", "Device token is required"))?;
			(token, None)
		};

		let uuid: Box<str> = random_id(DEVICE_ID_LENGTH)?.into();
		let record = DeviceRecord {
			uuid: uuid.clone(),
			user_uuid: user_uuid.into(),
			notifiable_type: request.notifiable_type,
			notifiable_id: request.notifiable_id,
			provider,
			platform,
			device_token,
			subscription_json,
			device_id: request.device_id,
			app_id: request.app_id,
			bundle_id: request.bundle_id,
			locale: request.locale,
			timezone: request.timezone,
		};

		let affected = self.adapter.register_device(&record).await?;
		info!(user_uuid, provider = %provider, uuid = %uuid, "device registered");
		Ok(RegisterResponse { affected, uuid, provider, platform })
	}

	/// List a user's devices, optionally filtered by provider/platform.
	///
	/// Filter values that name no known provider or platform match
	/// nothing and yield an empty list rather than an error.
	pub async fn list(&self, user_uuid: &str, query: &ListQuery) -> NvResult<Vec<DeviceView>> {
		if user_uuid.is_empty() {
			return Err(Error::validation("user_uuid", "User UUID is required"));
		}

		let provider = match query.provider.as_deref().filter(|p| !p.is_empty()) {
			Some(raw) => match raw.parse::<Provider>() {
				Ok(provider) => Some(provider),
				Err(_) => return Ok(Vec::new()),
			},
			None => None,
		};
		let platform = match query.platform.as_deref().filter(|p| !p.is_empty()) {
			Some(raw) => match raw.parse::<Platform>() {
				Ok(platform) => Some(platform),
				Err(_) => return Ok(Vec::new()),
			},
			None => None,
		};

		self.adapter.list_devices(user_uuid, &ListDeviceOptions { provider, platform }).await
	}

	/// Unregister a device by uuid or by provider+token. Revokes by
	/// default; `force` deletes the row.
	pub async fn unregister(
		&self,
		user_uuid: &str,
		request: UnregisterRequest,
	) -> NvResult<UnregisterResponse> {
		if user_uuid.is_empty() {
			return Err(Error::validation("user_uuid", "User UUID is required"));
		}

		let selector = if let Some(uuid) = request.uuid.filter(|u| !u.is_empty()) {
			DeviceSelector::Uuid(uuid)
		} else {
			let (Some(provider), Some(device_token)) =
				(request.provider.as_deref(), request.device_token.clone())
			else {
				return Err(Error::validation(
					"uuid|provider+device_token",
					"Provide device uuid or provider+device_token",
				));
			};
			DeviceSelector::Token { provider: provider.parse()?, device_token }
		};

		let (affected, action) = if request.force {
			(self.adapter.delete_device(user_uuid, &selector).await?, "deleted")
		} else {
			(self.adapter.revoke_device(user_uuid, &selector).await?, "revoked")
		};
		info!(user_uuid, action, affected, "device unregistered");
		Ok(UnregisterResponse { affected, action })
	}
}


// vim: ts=4
