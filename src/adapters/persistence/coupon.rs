use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::payments::CouponRepo,
    domain::entities::coupon::Coupon,
};

fn row_to_coupon(row: sqlx::postgres::PgRow) -> Coupon {
    Coupon {
        id: row.get("id"),
        code: row.get("code"),
        kind: row.get("kind"),
        value: row.get("value"),
        uses: row.get("uses"),
        max_uses: row.get("max_uses"),
        min_amount: row.get("min_amount"),
        expires_at: row.get("expires_at"),
    }
}

#[async_trait]
impl CouponRepo for PostgresPersistence {
    async fn get_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, kind, value, uses, max_uses, min_amount, expires_at
            FROM coupons WHERE UPPER(code) = UPPER($1)
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_coupon))
    }
}
