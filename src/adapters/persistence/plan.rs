use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::payments::PlanRepo,
    domain::entities::plan::Plan,
};

fn row_to_plan(row: sqlx::postgres::PgRow) -> Plan {
    Plan {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        duration_days: row.get("duration_days"),
        generation_quota: row.get("generation_quota"),
    }
}

#[async_trait]
impl PlanRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query(
            "SELECT id, name, price, duration_days, generation_quota FROM plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_plan))
    }
}
