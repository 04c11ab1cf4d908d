//! Device registry HTTP handlers

use axum::routing::get;
use axum::{Json, Router, extract::Query, extract::State};
use serde_json::json;

use crate::prelude::*;
use crate::registry::{
	DeviceRegistry, ListQuery, RegisterRequest, RegisterResponse, UnregisterRequest,
	UnregisterResponse,
};
use notiva_core::extract::Auth;
use notiva_types::types::DeviceView;

pub fn routes() -> Router<App> {
	Router::new().route(
		"/devices",
		get(list_devices).post(register_device).delete(unregister_device),
	)
}

/// POST /devices
///
/// Registers or refreshes a push device for the authenticated user.
/// Re-registering a known token updates its metadata; a new token for
/// the same user/provider slot rotates the old one out.
pub async fn register_device(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(body): Json<RegisterRequest>,
) -> NvResult<Json<RegisterResponse>> {
	let registry = DeviceRegistry::new(app.device_adapter.clone());
	let response = registry.register(&auth.user_uuid, body).await?;
	Ok(Json(response))
}

/// GET /devices
///
/// Lists the authenticated user's registered devices, newest activity
/// first. `provider` and `platform` query parameters filter the result.
pub async fn list_devices(
	State(app): State<App>,
	Auth(auth): Auth,
	Query(query): Query<ListQuery>,
) -> NvResult<Json<serde_json::Value>> {
	let registry = DeviceRegistry::new(app.device_adapter.clone());
	let devices: Vec<DeviceView> = registry.list(&auth.user_uuid, &query).await?;
	Ok(Json(json!({ "devices": devices })))
}

/// DELETE /devices
///
/// Unregisters a device by uuid or provider+token. Revokes by default;
/// `force: true` deletes the row.
pub async fn unregister_device(
	State(app): State<App>,
	Auth(auth): Auth,
	Json(body): Json<UnregisterRequest>,
) -> NvResult<Json<UnregisterResponse>> {
	let registry = DeviceRegistry::new(app.device_adapter.clone());
	let response = registry.unregister(&auth.user_uuid, body).await?;
	Ok(Json(response))
}

// vim: ts=4
