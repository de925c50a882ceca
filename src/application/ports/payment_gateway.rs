use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::app_error::AppResult;

// ============================================================================
// Port Types - Provider-agnostic domain types
// ============================================================================

/// Buyer identity as required by the PIX gateway order schema.
#[derive(Debug, Clone)]
pub struct CustomerIdentity {
    pub name: String,
    pub tax_id: String,
    pub email: String,
}

/// Everything the PIX gateway needs to open an order with an embedded QR
/// charge. `reference_id` is our correlation id (the payment row id).
#[derive(Debug, Clone)]
pub struct PixOrderIntent {
    pub reference_id: String,
    pub amount: Decimal,
    pub customer: CustomerIdentity,
    pub item_name: String,
}

/// What the PIX gateway hands back for a freshly created order.
#[derive(Debug, Clone, Serialize)]
pub struct PixArtifact {
    /// Provider-assigned order reference, used for later status queries.
    pub external_ref: String,
    /// Copy-paste payment code.
    pub qr_code: String,
    /// Base64-encoded QR image, when the provider returns one.
    pub qr_code_image: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Provider payment state normalized to a single paid marker.
#[derive(Debug, Clone, Default)]
pub struct GatewayPaymentStatus {
    pub paid: bool,
    /// Provider-reported payment time, when it exposes one.
    pub paid_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait PixGatewayPort: Send + Sync {
    async fn create_payment(&self, intent: &PixOrderIntent) -> AppResult<PixArtifact>;

    async fn get_payment_status(&self, external_ref: &str) -> AppResult<GatewayPaymentStatus>;
}

/// Request for a crypto receiving address tied to one payment.
#[derive(Debug, Clone)]
pub struct CryptoIntent {
    pub payment_id: Uuid,
    pub amount_btc: Decimal,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CryptoArtifact {
    pub address: String,
    pub network: String,
    /// Scannable `bitcoin:` payment URI.
    pub payment_uri: String,
    /// True when address generation failed and a locally synthesized
    /// placeholder was issued instead. Degraded payments are verified
    /// manually downstream.
    pub degraded: bool,
}

/// On-chain state of a receiving address.
#[derive(Debug, Clone, Default)]
pub struct AddressStatus {
    pub received_btc: Decimal,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CryptoGatewayPort: Send + Sync {
    /// Always yields an artifact: failures degrade to a placeholder address
    /// rather than blocking the payment.
    async fn create_payment(&self, intent: &CryptoIntent) -> AppResult<CryptoArtifact>;

    async fn get_address_status(&self, address: &str) -> AppResult<AddressStatus>;
}
