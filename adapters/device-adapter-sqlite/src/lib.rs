use async_trait::async_trait;
use sqlx::{
	Row,
	sqlite::{self, SqlitePool, SqliteRow},
};
use std::path::Path;

use notiva::{
	device_adapter::DeviceAdapter,
	prelude::*,
	types::{DeviceRecord, DeviceSelector, DeviceView, ListDeviceOptions, now},
};

fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

#[derive(Debug)]
pub struct DeviceAdapterSqlite {
	db: SqlitePool,
}

impl DeviceAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> NvResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;

		init_db(&db).await.inspect_err(inspect).or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl DeviceAdapter for DeviceAdapterSqlite {
	async fn register_device(&self, record: &DeviceRecord) -> NvResult<u64> {
		let now = now()?.0;
		let mut tx = self.db.begin().await.inspect_err(inspect).or(Err(Error::DbError))?;

		// Rotation: older tokens for the same owner slot become invalid.
		// A device_id narrows the slot to one physical device.
		let rotated = if let Some(device_id) = record.device_id.as_deref() {
			sqlx::query(
				"UPDATE push_devices SET status='invalid', invalidated_at=?1, updated_at=?1
				WHERE user_uuid=?2 AND provider=?3 AND device_id=?4 AND device_token<>?5",
			)
			.bind(now)
			.bind(record.user_uuid.as_ref())
			.bind(record.provider.as_str())
			.bind(device_id)
			.bind(record.device_token.as_ref())
			.execute(&mut *tx)
			.await
		} else {
			sqlx::query(
				"UPDATE push_devices SET status='invalid', invalidated_at=?1, updated_at=?1
				WHERE user_uuid=?2 AND provider=?3 AND device_token<>?4",
			)
			.bind(now)
			.bind(record.user_uuid.as_ref())
			.bind(record.provider.as_str())
			.bind(record.device_token.as_ref())
			.execute(&mut *tx)
			.await
		};
		rotated.inspect_err(inspect).or(Err(Error::DbError))?;

		// Upsert on (provider, device_token): a known token keeps its
		// uuid and registration time but refreshes metadata and comes
		// back active.
		let res = sqlx::query(
			"INSERT INTO push_devices (
				uuid, user_uuid, notifiable_type, notifiable_id, provider, platform,
				device_token, subscription_json, device_id, app_id, bundle_id, locale, timezone,
				status, registered_at, last_seen_at, created_at, updated_at
			) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 'active', ?14, ?14, ?14, ?14)
			ON CONFLICT(provider, device_token) DO UPDATE SET
				user_uuid=excluded.user_uuid,
				notifiable_type=excluded.notifiable_type,
				notifiable_id=excluded.notifiable_id,
				platform=excluded.platform,
				subscription_json=excluded.subscription_json,
				device_id=excluded.device_id,
				app_id=excluded.app_id,
				bundle_id=excluded.bundle_id,
				locale=excluded.locale,
				timezone=excluded.timezone,
				status='active',
				invalidated_at=NULL,
				last_seen_at=excluded.last_seen_at,
				updated_at=excluded.updated_at",
		)
		.bind(record.uuid.as_ref())
		.bind(record.user_uuid.as_ref())
		.bind(record.notifiable_type.as_deref())
		.bind(record.notifiable_id.as_deref())
		.bind(record.provider.as_str())
		.bind(record.platform.map(|p| p.as_str()))
		.bind(record.device_token.as_ref())
		.bind(record.subscription_json.as_deref())
		.bind(record.device_id.as_deref())
		.bind(record.app_id.as_deref())
		.bind(record.bundle_id.as_deref())
		.bind(record.locale.as_deref())
		.bind(record.timezone.as_deref())
		.bind(now)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

		tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
		Ok(res.rows_affected())
	}

	async fn list_devices(
		&self,
		user_uuid: &str,
		opts: &ListDeviceOptions,
	) -> NvResult<Vec<DeviceView>> {
		let mut query = sqlx::QueryBuilder::new(
			"SELECT uuid, provider, platform, device_id, device_token, status,
			registered_at, last_seen_at, invalidated_at, app_id, bundle_id, locale, timezone
			FROM push_devices WHERE user_uuid=",
		);
		query.push_bind(user_uuid);
		if let Some(provider) = opts.provider {
			query.push(" AND provider=").push_bind(provider.as_str());
		}
		if let Some(platform) = opts.platform {
			query.push(" AND platform=").push_bind(platform.as_str());
		}
		query.push(" ORDER BY last_seen_at DESC");

		let rows = query
			.build()
			.fetch_all(&self.db)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;
		rows.iter().map(map_device).collect()
	}

	async fn revoke_device(&self, user_uuid: &str, selector: &DeviceSelector) -> NvResult<u64> {
		let now = now()?.0;
		let res = match selector {
			DeviceSelector::Uuid(uuid) => {
				sqlx::query(
					"UPDATE push_devices SET status='revoked', invalidated_at=?1, updated_at=?1
					WHERE user_uuid=?2 AND uuid=?3",
				)
				.bind(now)
				.bind(user_uuid)
				.bind(uuid.as_ref())
				.execute(&self.db)
				.await
			}
			DeviceSelector::Token { provider, device_token } => {
				sqlx::query(
					"UPDATE push_devices SET status='revoked', invalidated_at=?1, updated_at=?1
					WHERE user_uuid=?2 AND provider=?3 AND device_token=?4",
				)
				.bind(now)
				.bind(user_uuid)
				.bind(provider.as_str())
				.bind(device_token.as_ref())
				.execute(&self.db)
				.await
			}
		};
		let res = res.inspect_err(inspect).or(Err(Error::DbError))?;
		Ok(res.rows_affected())
	}

	async fn delete_device(&self, user_uuid: &str, selector: &DeviceSelector) -> NvResult<u64> {
		let res = match selector {
			DeviceSelector::Uuid(uuid) => {
				sqlx::query("DELETE FROM push_devices WHERE user_uuid=?1 AND uuid=?2")
					.bind(user_uuid)
					.bind(uuid.as_ref())
					.execute(&self.db)
					.await
			}
			DeviceSelector::Token { provider, device_token } => {
				sqlx::query(
					"DELETE FROM push_devices WHERE user_uuid=?1 AND provider=?2 AND device_token=?3",
				)
				.bind(user_uuid)
				.bind(provider.as_str())
				.bind(device_token.as_ref())
				.execute(&self.db)
				.await
			}
		};
		let res = res.inspect_err(inspect).or(Err(Error::DbError))?;
		Ok(res.rows_affected())
	}
}

fn map_device(row: &SqliteRow) -> NvResult<DeviceView> {
	let provider: &str = row.try_get("provider").or(Err(Error::DbError))?;
	let status: &str = row.try_get("status").or(Err(Error::DbError))?;
	let platform: Option<&str> = row.try_get("platform").or(Err(Error::DbError))?;
	Ok(DeviceView {
		uuid: row.try_get("uuid").or(Err(Error::DbError))?,
		provider: provider.parse().or(Err(Error::DbError))?,
		platform: platform.map(str::parse).transpose().or(Err(Error::DbError))?,
		device_id: row.try_get("device_id").or(Err(Error::DbError))?,
		device_token: row.try_get("device_token").or(Err(Error::DbError))?,
		status: status.parse().or(Err(Error::DbError))?,
		registered_at: opt_timestamp(row, "registered_at")?,
		last_seen_at: opt_timestamp(row, "last_seen_at")?,
		invalidated_at: opt_timestamp(row, "invalidated_at")?,
		app_id: row.try_get("app_id").or(Err(Error::DbError))?,
		bundle_id: row.try_get("bundle_id").or(Err(Error::DbError))?,
		locale: row.try_get("locale").or(Err(Error::DbError))?,
		timezone: row.try_get("timezone").or(Err(Error::DbError))?,
	})
}

fn opt_timestamp(row: &SqliteRow, column: &str) -> NvResult<Option<Timestamp>> {
	let value: Option<i64> = row.try_get(column).or(Err(Error::DbError))?;
	Ok(value.map(Timestamp))
}

async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Push devices //
	//////////////////
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS push_devices (
		id integer PRIMARY KEY AUTOINCREMENT,
		uuid text NOT NULL,
		user_uuid text,
		notifiable_type text,
		notifiable_id text,
		provider text NOT NULL DEFAULT 'fcm',
		platform text,
		device_token text,
		subscription_json json,
		device_id text,
		app_id text,
		bundle_id text,
		locale text,
		timezone text,
		status text NOT NULL DEFAULT 'active',
		registered_at datetime DEFAULT (unixepoch()),
		last_seen_at datetime,
		invalidated_at datetime,
		created_at datetime DEFAULT (unixepoch()),
		updated_at datetime
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS unique_device_uuid ON push_devices (uuid)")
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS unique_provider_token ON push_devices (provider, device_token)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_device_user ON push_devices (user_uuid)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_device_status ON push_devices (status)")
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_device_provider_platform ON push_devices (provider, platform)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_device_last_seen ON push_devices (last_seen_at)")
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
