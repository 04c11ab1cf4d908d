//! Device storage adapter trait
//!
//! Persistence for registered push devices is pluggable. The engine only
//! talks to this trait; the bundled SQLite adapter is one implementation.

use async_trait::async_trait;

use crate::prelude::*;
use crate::types::{DeviceRecord, DeviceSelector, DeviceView, ListDeviceOptions};

#[async_trait]
pub trait DeviceAdapter: Send + Sync + std::fmt::Debug {
	/// Register a device, rotating out stale tokens for the same owner slot.
	///
	/// Any existing row for the same `(user_uuid, provider)` (and
	/// `device_id`, when the record carries one) holding a *different*
	/// token is marked invalid first. The record itself is then upserted
	/// on the `(provider, device_token)` unique key: a re-registration of
	/// a known token refreshes its metadata and reactivates it, keeping
	/// the original uuid and registration time.
	///
	/// Returns the number of rows affected by the upsert.
	async fn register_device(&self, record: &DeviceRecord) -> NvResult<u64>;

	/// List a user's devices, newest activity first.
	async fn list_devices(
		&self,
		user_uuid: &str,
		opts: &ListDeviceOptions,
	) -> NvResult<Vec<DeviceView>>;

	/// Soft-unregister: mark the selected device revoked and stamp
	/// `invalidated_at`. Returns the number of rows updated.
	async fn revoke_device(&self, user_uuid: &str, selector: &DeviceSelector) -> NvResult<u64>;

	/// Hard-unregister: delete the selected device row outright.
	/// Returns the number of rows deleted.
	async fn delete_device(&self, user_uuid: &str, selector: &DeviceSelector) -> NvResult<u64>;
}

// vim: ts=4
