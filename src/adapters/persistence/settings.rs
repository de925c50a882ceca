use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    infra::provider_config::SettingsRepo,
};

#[async_trait]
impl SettingsRepo for PostgresPersistence {
    async fn get_setting(&self, key: &str) -> AppResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::from)?;

        Ok(value)
    }
}
