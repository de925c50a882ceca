use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::payments::{NewPayment, PaymentRepo},
    domain::entities::payment::{Payment, PaymentMethod},
};

fn row_to_payment(row: sqlx::postgres::PgRow) -> Payment {
    Payment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan_id: row.get("plan_id"),
        amount: row.get("amount"),
        method: row.get("method"),
        status: row.get("status"),
        external_ref: row.get("external_ref"),
        qr_code: row.get("qr_code"),
        qr_code_image: row.get("qr_code_image"),
        crypto_address: row.get("crypto_address"),
        crypto_network: row.get("crypto_network"),
        crypto_amount: row.get("crypto_amount"),
        expires_at: row.get("expires_at"),
        paid_at: row.get("paid_at"),
        coupon_id: row.get("coupon_id"),
        created_at: row.get("created_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, plan_id, amount, method, status,
    external_ref, qr_code, qr_code_image,
    crypto_address, crypto_network, crypto_amount,
    expires_at, paid_at, coupon_id, created_at
"#;

#[async_trait]
impl PaymentRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_payment))
    }

    async fn find_pending(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        method: PaymentMethod,
    ) -> AppResult<Option<Payment>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM payments
            WHERE user_id = $1 AND plan_id = $2 AND method = $3 AND status = 'pending'
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(plan_id)
        .bind(method)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_payment))
    }

    async fn find_any_pending_for_user(&self, user_id: Uuid) -> AppResult<Option<Payment>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM payments
            WHERE user_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(row_to_payment))
    }

    async fn create(&self, input: &NewPayment) -> AppResult<Payment> {
        // The partial unique index on (user_id, plan_id, method) for pending
        // rows turns a concurrent duplicate into AppError::Conflict, which
        // the orchestrator resolves by re-querying.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payments (
                id, user_id, plan_id, amount, method, status,
                external_ref, qr_code, qr_code_image, crypto_amount,
                expires_at, coupon_id
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(input.id)
        .bind(input.user_id)
        .bind(input.plan_id)
        .bind(input.amount)
        .bind(input.method)
        .bind(&input.external_ref)
        .bind(&input.qr_code)
        .bind(&input.qr_code_image)
        .bind(input.crypto_amount)
        .bind(input.expires_at)
        .bind(input.coupon_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_payment(row))
    }

    async fn set_crypto_artifact(
        &self,
        id: Uuid,
        external_ref: &str,
        address: &str,
        network: &str,
        crypto_amount: Decimal,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                external_ref = $2,
                crypto_address = $3,
                crypto_network = $4,
                crypto_amount = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(external_ref)
        .bind(address)
        .bind(network)
        .bind(crypto_amount)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn settle(&self, payment_id: Uuid, paid_at: DateTime<Utc>) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Lock the payment row; the `status = 'pending'` guard makes the
        // transition monotonic and the whole settlement exactly-once.
        let row = sqlx::query(
            r#"
            SELECT p.user_id, p.plan_id, p.coupon_id, pl.duration_days
            FROM payments p
            JOIN plans pl ON pl.id = p.plan_id
            WHERE p.id = $1 AND p.status = 'pending'
            FOR UPDATE OF p
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(AppError::from)?;
            return Ok(false);
        };
        let user_id: Uuid = row.get("user_id");
        let plan_id: Uuid = row.get("plan_id");
        let coupon_id: Option<Uuid> = row.get("coupon_id");
        let duration_days: i32 = row.get("duration_days");

        sqlx::query(
            "UPDATE payments SET status = 'paid', paid_at = $2 WHERE id = $1 AND status = 'pending'",
        )
        .bind(payment_id)
        .bind(paid_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        if let Some(coupon_id) = coupon_id {
            sqlx::query("UPDATE coupons SET uses = uses + 1 WHERE id = $1")
                .bind(coupon_id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::from)?;
        }

        // Renewal before expiry adds to the remaining time instead of
        // resetting it.
        sqlx::query(
            r#"
            UPDATE users SET
                plan_id = $2,
                plan_expires_at = GREATEST(NOW(), COALESCE(plan_expires_at, NOW()))
                    + make_interval(days => $3)
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(plan_id)
        .bind(duration_days)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;

        tracing::info!(
            payment_id = %payment_id,
            user_id = %user_id,
            plan_id = %plan_id,
            "settled payment"
        );
        Ok(true)
    }
}
