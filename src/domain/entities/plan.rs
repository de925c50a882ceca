use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A purchasable entitlement: unlocks credential generation for a fixed
/// number of days.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    /// Price in BRL.
    pub price: Decimal,
    pub duration_days: i32,
    /// Generations per day; 0 means unlimited.
    pub generation_quota: i32,
}

impl Plan {
    pub fn is_unlimited(&self) -> bool {
        self.generation_quota == 0
    }
}
