//! Device adapter registration and lifecycle tests
//!
//! Exercises upsert, token rotation, filtering, and revocation against
//! a real on-disk SQLite database.

use notiva::device_adapter::DeviceAdapter;
use notiva::types::{
	DeviceRecord, DeviceSelector, DeviceStatus, ListDeviceOptions, Platform, Provider,
};
use notiva_device_adapter_sqlite::DeviceAdapterSqlite;
use tempfile::TempDir;

async fn create_test_adapter() -> (DeviceAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = DeviceAdapterSqlite::new(temp_dir.path().join("devices.db"))
		.await
		.expect("Failed to create adapter");
	(adapter, temp_dir)
}

fn record(uuid: &str, user: &str, provider: Provider, token: &str) -> DeviceRecord {
	DeviceRecord {
		uuid: uuid.into(),
		user_uuid: user.into(),
		notifiable_type: None,
		notifiable_id: None,
		provider,
		platform: Some(Platform::Android),
		device_token: token.into(),
		subscription_json: None,
		device_id: None,
		app_id: None,
		bundle_id: None,
		locale: None,
		timezone: None,
	}
}

#[tokio::test]
async fn test_register_and_list_device() {
	let (adapter, _temp) = create_test_adapter().await;

	let affected = adapter
		.register_device(&record("dev-00000001", "user-1", Provider::Fcm, "tok-a"))
		.await
		.expect("Should register device");
	assert_eq!(affected, 1);

	let devices = adapter
		.list_devices("user-1", &ListDeviceOptions::default())
		.await
		.expect("Should list devices");
	assert_eq!(devices.len(), 1);
	assert_eq!(&*devices[0].uuid, "dev-00000001");
	assert_eq!(devices[0].provider, Provider::Fcm);
	assert_eq!(devices[0].status, DeviceStatus::Active);
	assert_eq!(devices[0].device_token.as_deref(), Some("tok-a"));
	assert!(devices[0].registered_at.is_some());
}

#[tokio::test]
async fn test_reregistering_known_token_keeps_uuid() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter
		.register_device(&record("dev-00000001", "user-1", Provider::Fcm, "tok-a"))
		.await
		.expect("first registration");

	// Same token again, new uuid in the record and fresh metadata
	let mut update = record("dev-00000002", "user-1", Provider::Fcm, "tok-a");
	update.locale = Some("hu-HU".into());
	adapter.register_device(&update).await.expect("re-registration");

	let devices = adapter
		.list_devices("user-1", &ListDeviceOptions::default())
		.await
		.expect("Should list devices");
	assert_eq!(devices.len(), 1, "upsert must not create a second row");
	assert_eq!(&*devices[0].uuid, "dev-00000001", "original uuid survives");
	assert_eq!(devices[0].locale.as_deref(), Some("hu-HU"), "metadata refreshed");
	assert_eq!(devices[0].status, DeviceStatus::Active);
}

#[tokio::test]
async fn test_new_token_rotates_out_the_old_one() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter
		.register_device(&record("dev-00000001", "user-1", Provider::Fcm, "tok-old"))
		.await
		.expect("old token");
	adapter
		.register_device(&record("dev-00000002", "user-1", Provider::Fcm, "tok-new"))
		.await
		.expect("new token");

	let devices = adapter
		.list_devices("user-1", &ListDeviceOptions::default())
		.await
		.expect("Should list devices");
	assert_eq!(devices.len(), 2);

	let old = devices.iter().find(|d| d.device_token.as_deref() == Some("tok-old")).unwrap();
	let new = devices.iter().find(|d| d.device_token.as_deref() == Some("tok-new")).unwrap();
	assert_eq!(old.status, DeviceStatus::Invalid);
	assert!(old.invalidated_at.is_some());
	assert_eq!(new.status, DeviceStatus::Active);
}

#[tokio::test]
async fn test_rotation_is_scoped_by_device_id() {
	let (adapter, _temp) = create_test_adapter().await;

	let mut phone = record("dev-00000001", "user-1", Provider::Fcm, "tok-phone");
	phone.device_id = Some("phone".into());
	adapter.register_device(&phone).await.expect("phone");

	let mut tablet = record("dev-00000002", "user-1", Provider::Fcm, "tok-tablet");
	tablet.device_id = Some("tablet".into());
	adapter.register_device(&tablet).await.expect("tablet");

	let devices = adapter
		.list_devices("user-1", &ListDeviceOptions::default())
		.await
		.expect("Should list devices");
	assert!(
		devices.iter().all(|d| d.status == DeviceStatus::Active),
		"tokens on different devices must not rotate each other out"
	);
}

#[tokio::test]
async fn test_rotation_does_not_cross_providers_or_users() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter
		.register_device(&record("dev-00000001", "user-1", Provider::Fcm, "tok-fcm"))
		.await
		.expect("fcm");
	adapter
		.register_device(&record("dev-00000002", "user-1", Provider::Apns, "tok-apns"))
		.await
		.expect("apns");
	adapter
		.register_device(&record("dev-00000003", "user-2", Provider::Fcm, "tok-other"))
		.await
		.expect("other user");

	for user in ["user-1", "user-2"] {
		let devices = adapter
			.list_devices(user, &ListDeviceOptions::default())
			.await
			.expect("Should list devices");
		assert!(devices.iter().all(|d| d.status == DeviceStatus::Active));
	}
}

#[tokio::test]
async fn test_list_filters_by_provider_and_platform() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter
		.register_device(&record("dev-00000001", "user-1", Provider::Fcm, "tok-a"))
		.await
		.expect("fcm");
	let mut ios = record("dev-00000002", "user-1", Provider::Apns, "tok-b");
	ios.platform = Some(Platform::Ios);
	adapter.register_device(&ios).await.expect("apns");

	let opts = ListDeviceOptions { provider: Some(Provider::Apns), platform: None };
	let devices = adapter.list_devices("user-1", &opts).await.expect("filter by provider");
	assert_eq!(devices.len(), 1);
	assert_eq!(devices[0].provider, Provider::Apns);

	let opts = ListDeviceOptions { provider: None, platform: Some(Platform::Ios) };
	let devices = adapter.list_devices("user-1", &opts).await.expect("filter by platform");
	assert_eq!(devices.len(), 1);
	assert_eq!(devices[0].platform, Some(Platform::Ios));

	let devices = adapter
		.list_devices("user-2", &ListDeviceOptions::default())
		.await
		.expect("other user");
	assert!(devices.is_empty());
}

#[tokio::test]
async fn test_revoke_by_uuid() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter
		.register_device(&record("dev-00000001", "user-1", Provider::Fcm, "tok-a"))
		.await
		.expect("register");

	let affected = adapter
		.revoke_device("user-1", &DeviceSelector::Uuid("dev-00000001".into()))
		.await
		.expect("revoke");
	assert_eq!(affected, 1);

	let devices = adapter
		.list_devices("user-1", &ListDeviceOptions::default())
		.await
		.expect("list");
	assert_eq!(devices[0].status, DeviceStatus::Revoked);
	assert!(devices[0].invalidated_at.is_some());
}

#[tokio::test]
async fn test_revoke_by_token_checks_ownership() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter
		.register_device(&record("dev-00000001", "user-1", Provider::Fcm, "tok-a"))
		.await
		.expect("register");

	let selector =
		DeviceSelector::Token { provider: Provider::Fcm, device_token: "tok-a".into() };
	let affected = adapter.revoke_device("user-2", &selector).await.expect("wrong user");
	assert_eq!(affected, 0, "another user's token must not be revocable");

	let affected = adapter.revoke_device("user-1", &selector).await.expect("owner");
	assert_eq!(affected, 1);
}

#[tokio::test]
async fn test_delete_removes_the_row() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter
		.register_device(&record("dev-00000001", "user-1", Provider::Fcm, "tok-a"))
		.await
		.expect("register");

	let affected = adapter
		.delete_device("user-1", &DeviceSelector::Uuid("dev-00000001".into()))
		.await
		.expect("delete");
	assert_eq!(affected, 1);

	let devices = adapter
		.list_devices("user-1", &ListDeviceOptions::default())
		.await
		.expect("list");
	assert!(devices.is_empty());

	let affected = adapter
		.delete_device("user-1", &DeviceSelector::Uuid("dev-00000001".into()))
		.await
		.expect("double delete");
	assert_eq!(affected, 0);
}

// vim: ts=4
