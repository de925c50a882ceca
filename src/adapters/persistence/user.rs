use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::payments::UserRepo,
    domain::entities::user::UserProfile,
};

fn row_to_user(row: sqlx::postgres::PgRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        tax_id: row.get("tax_id"),
        plan_id: row.get("plan_id"),
        plan_expires_at: row.get("plan_expires_at"),
        bonus_generations: row.get("bonus_generations"),
    }
}

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, tax_id, plan_id, plan_expires_at, bonus_generations
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_user))
    }

    async fn set_tax_id(&self, user_id: Uuid, tax_id: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET tax_id = $2 WHERE id = $1")
            .bind(user_id)
            .bind(tax_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
