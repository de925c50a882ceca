use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "coupon_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    Percent,
    Fixed,
}

/// A discount rule. Its usage counter is incremented exactly once per settled
/// payment that references it, at settlement time.
#[derive(Debug, Clone, Serialize)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    pub uses: i32,
    /// 0 means no cap.
    pub max_uses: i32,
    pub min_amount: Decimal,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
    pub fn is_exhausted(&self) -> bool {
        self.max_uses > 0 && self.uses >= self.max_uses
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Discounted amount for an order, clamped at zero and rounded to
    /// centavos.
    pub fn apply(&self, amount: Decimal) -> Decimal {
        let discounted = match self.kind {
            CouponKind::Percent => amount - amount * self.value / Decimal::from(100),
            CouponKind::Fixed => amount - self.value,
        };
        discounted.max(Decimal::ZERO).round_dp(2)
    }
}
