use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::settings::{
    flag_from_setting, AnonymizeDates, ArchiveSettings, SuspendMode, KEY_ALLOW_REFINALIZE,
    KEY_ANONYMIZE_DATES, KEY_CRYPT_KEY, KEY_ENCRYPT_ZIP_FILES, KEY_SUSPEND_MODE,
    KEY_USERNAME_HASH,
};
use crate::utils::crypto::generate_cipher_key;

/// Reads archive policy settings from the settings store. Settings are loaded
/// once per request and passed on explicitly.
#[derive(Clone)]
pub struct SettingsService {
    pool: PgPool,
}

impl SettingsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn get(&self, name: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar(r#"SELECT value FROM plugin_settings WHERE name = $1"#)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    pub async fn load(&self) -> Result<ArchiveSettings> {
        let rows: Vec<(String, String)> =
            sqlx::query_as(r#"SELECT name, value FROM plugin_settings"#)
                .fetch_all(&self.pool)
                .await?;

        let mut settings = ArchiveSettings::default();
        for (name, value) in rows {
            match name.as_str() {
                KEY_ANONYMIZE_DATES => {
                    settings.anonymize_dates = AnonymizeDates::from_setting(&value)
                }
                KEY_USERNAME_HASH => settings.username_hash = flag_from_setting(&value),
                KEY_ALLOW_REFINALIZE => settings.allow_refinalize = flag_from_setting(&value),
                KEY_ENCRYPT_ZIP_FILES => settings.encrypt_zip_files = flag_from_setting(&value),
                KEY_SUSPEND_MODE => settings.suspend_mode = SuspendMode::from_setting(&value),
                _ => {}
            }
        }
        Ok(settings)
    }

    /// Get or create the cipher key. The conditional insert makes the first
    /// writer win; concurrent callers re-read and converge on the same key.
    pub async fn cipher_key(&self) -> Result<String> {
        if let Some(key) = self.get(KEY_CRYPT_KEY).await? {
            return Ok(key);
        }

        let fresh = generate_cipher_key();
        sqlx::query(
            r#"INSERT INTO plugin_settings (name, value) VALUES ($1, $2)
               ON CONFLICT (name) DO NOTHING"#,
        )
        .bind(KEY_CRYPT_KEY)
        .bind(&fresh)
        .execute(&self.pool)
        .await?;

        self.get(KEY_CRYPT_KEY)
            .await?
            .ok_or_else(|| Error::Internal("Cipher key missing after creation".to_string()))
    }
}
