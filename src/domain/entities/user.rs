use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The subscription-relevant slice of a user. `bonus_generations` is owned by
/// other collaborators (affiliate and raffle rewards) and is only carried
/// here, never mutated by this subsystem.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub tax_id: Option<String>,
    pub plan_id: Option<Uuid>,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub bonus_generations: i32,
}
