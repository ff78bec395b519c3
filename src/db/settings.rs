//! Settings database access
//!
//! Read/write settings from the settings table (key-value store). The sink
//! owns two keys: `vol_left` and `vol_right`, the stereo volume percentages
//! that survive stream open/close and process restarts. Missing keys are
//! initialized with their defaults and written back.

use crate::error::{Error, Result};
use crate::volume::StereoVolume;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

/// Default volume percent for either channel
const DEFAULT_VOLUME_PERCENT: u8 = 100;

/// Create the settings table if it does not exist.
pub async fn ensure_settings_table(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize sink settings with default values.
///
/// Existing values are left untouched, so this is safe to run on every
/// startup.
pub async fn init_settings_defaults(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Initializing default sink settings");

    let defaults = [
        ("vol_left", DEFAULT_VOLUME_PERCENT.to_string()),
        ("vol_right", DEFAULT_VOLUME_PERCENT.to_string()),
    ];

    for (key, default_value) in defaults {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
                .bind(key)
                .fetch_one(pool)
                .await?;

        if !exists {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(&default_value)
                .execute(pool)
                .await?;

            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
    }

    Ok(())
}

/// Get the persisted stereo volume (default 100/100).
///
/// Missing channels are initialized with the default and written back.
pub async fn get_volume(pool: &Pool<Sqlite>) -> Result<StereoVolume> {
    let left = get_volume_channel(pool, "vol_left").await?;
    let right = get_volume_channel(pool, "vol_right").await?;

    Ok(StereoVolume::new(left, right))
}

/// Persist both volume channels.
pub async fn set_volume(pool: &Pool<Sqlite>, volume: StereoVolume) -> Result<()> {
    set_setting(pool, "vol_left", volume.left).await?;
    set_setting(pool, "vol_right", volume.right).await
}

async fn get_volume_channel(pool: &Pool<Sqlite>, key: &str) -> Result<u8> {
    match get_setting::<u8>(pool, key).await? {
        Some(percent) => Ok(percent.min(100)),
        None => {
            set_setting(pool, key, DEFAULT_VOLUME_PERCENT).await?;
            Ok(DEFAULT_VOLUME_PERCENT)
        }
    }
}

/// Get a typed setting value by key.
///
/// Returns `None` if the key is absent; parse failures are reported as
/// [`Error::Config`] rather than silently defaulted.
pub async fn get_setting<T: FromStr>(pool: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value_opt: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match value_opt {
        Some((value,)) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for setting '{}': {}", key, value))),
        None => Ok(None),
    }
}

/// Set a setting value by key, inserting or replacing.
pub async fn set_setting<T: ToString>(pool: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}
