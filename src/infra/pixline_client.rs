//! Raw HTTP client for the Pixline PIX gateway: order creation with an
//! embedded QR charge, and order status queries.
//!
//! Pixline has shipped more than one response layout for the same API
//! version, so QR payloads and paid markers are pulled out by an ordered
//! list of typed extractors rather than a single fixed path.

use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::GatewayPaymentStatus,
    infra::http_client::{
        classify_error_status, classify_transport_error, provider_message, try_build_client,
    },
};

const API_VERSION: &str = "2023-06-01";

pub struct PixlineClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    seller_account: Option<String>,
}

impl PixlineClient {
    pub fn new(
        base_url: Url,
        api_key: SecretString,
        seller_account: Option<String>,
    ) -> AppResult<Self> {
        let client = try_build_client()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key,
            seller_account,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn apply_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder
            .bearer_auth(self.api_key.expose_secret())
            .header("X-Api-Version", API_VERSION);
        match &self.seller_account {
            Some(account) => builder.header("X-Seller-Account", account),
            None => builder,
        }
    }

    pub async fn create_order(&self, order: &PixlineOrderRequest) -> AppResult<Value> {
        let response = self
            .apply_headers(self.client.post(self.endpoint("orders")))
            .json(order)
            .send()
            .await
            .map_err(classify_transport_error)?;

        self.handle_response(response).await
    }

    pub async fn get_order(&self, reference: &str) -> AppResult<Value> {
        let response = self
            .apply_headers(
                self.client
                    .get(self.endpoint(&format!("orders/{reference}"))),
            )
            .send()
            .await
            .map_err(classify_transport_error)?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> AppResult<Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Pixline API error");
            return Err(classify_error_status(status, provider_message(&body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "failed to parse Pixline response");
            AppError::Internal(format!("failed to parse Pixline response: {e}"))
        })
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PixlineOrderRequest {
    pub reference_id: String,
    pub customer: PixlineCustomer,
    pub items: Vec<PixlineItem>,
    pub qr_codes: Vec<PixlineQrRequest>,
}

#[derive(Debug, Serialize)]
pub struct PixlineCustomer {
    pub name: String,
    pub tax_id: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct PixlineItem {
    pub name: String,
    pub quantity: u32,
    /// Centavos.
    pub unit_amount: i64,
}

#[derive(Debug, Serialize)]
pub struct PixlineQrRequest {
    pub amount: PixlineAmount,
    pub expiration_date: String,
}

#[derive(Debug, Serialize)]
pub struct PixlineAmount {
    /// Centavos.
    pub value: i64,
}

// ============================================================================
// Response Extraction
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct QrPayload {
    pub text: String,
    pub image_base64: Option<String>,
}

pub fn extract_order_id(value: &Value) -> Option<String> {
    value["id"]
        .as_str()
        .or_else(|| value["order"]["id"].as_str())
        .map(|s| s.to_string())
}

/// Pull the QR payload (copy-paste code + display image) out of an order
/// response. Tries every known layout in order and returns the first hit.
pub fn extract_qr(value: &Value) -> Option<QrPayload> {
    const EXTRACTORS: [fn(&Value) -> Option<QrPayload>; 4] = [
        qr_from_qr_codes,
        qr_from_charges,
        qr_from_flat,
        qr_from_point_of_interaction,
    ];
    EXTRACTORS.iter().find_map(|extract| extract(value))
}

#[derive(Deserialize)]
struct QrCodesShape {
    qr_codes: Vec<QrCodeEntry>,
}

#[derive(Deserialize)]
struct QrCodeEntry {
    text: Option<String>,
    #[serde(default)]
    links: Vec<QrCodeLink>,
}

#[derive(Deserialize)]
struct QrCodeLink {
    media: Option<String>,
    href: Option<String>,
}

fn qr_from_qr_codes(value: &Value) -> Option<QrPayload> {
    let shape: QrCodesShape = serde_json::from_value(value.clone()).ok()?;
    let entry = shape.qr_codes.into_iter().next()?;
    let text = entry.text.filter(|t| !t.is_empty())?;
    let image = entry
        .links
        .into_iter()
        .find(|l| l.media.as_deref().is_some_and(|m| m.starts_with("image/")))
        .and_then(|l| l.href);
    Some(QrPayload {
        text,
        image_base64: image,
    })
}

#[derive(Deserialize)]
struct ChargesShape {
    charges: Vec<ChargeEntry>,
}

#[derive(Deserialize)]
struct ChargeEntry {
    payment_method: Option<ChargePaymentMethod>,
}

#[derive(Deserialize)]
struct ChargePaymentMethod {
    qr_code: Option<ChargeQrCode>,
}

#[derive(Deserialize)]
struct ChargeQrCode {
    text: Option<String>,
    image_base64: Option<String>,
}

fn qr_from_charges(value: &Value) -> Option<QrPayload> {
    let shape: ChargesShape = serde_json::from_value(value.clone()).ok()?;
    shape.charges.into_iter().find_map(|charge| {
        let qr = charge.payment_method?.qr_code?;
        let text = qr.text.filter(|t| !t.is_empty())?;
        Some(QrPayload {
            text,
            image_base64: qr.image_base64,
        })
    })
}

#[derive(Deserialize)]
struct FlatShape {
    qr_code: String,
    qr_code_base64: Option<String>,
}

fn qr_from_flat(value: &Value) -> Option<QrPayload> {
    let shape: FlatShape = serde_json::from_value(value.clone()).ok()?;
    if shape.qr_code.is_empty() {
        return None;
    }
    Some(QrPayload {
        text: shape.qr_code,
        image_base64: shape.qr_code_base64,
    })
}

#[derive(Deserialize)]
struct PointOfInteractionShape {
    point_of_interaction: PointOfInteraction,
}

#[derive(Deserialize)]
struct PointOfInteraction {
    transaction_data: TransactionData,
}

#[derive(Deserialize)]
struct TransactionData {
    qr_code: String,
    qr_code_base64: Option<String>,
}

fn qr_from_point_of_interaction(value: &Value) -> Option<QrPayload> {
    let shape: PointOfInteractionShape = serde_json::from_value(value.clone()).ok()?;
    if shape.point_of_interaction.transaction_data.qr_code.is_empty() {
        return None;
    }
    Some(QrPayload {
        text: shape.point_of_interaction.transaction_data.qr_code,
        image_base64: shape.point_of_interaction.transaction_data.qr_code_base64,
    })
}

const PAID_MARKERS: [&str; 3] = ["paid", "confirmed", "completed"];

/// Normalize an order status response to a single paid marker. Status
/// strings can live at the top level, under an `order` object, or on the
/// individual charges; any one affirmative marker is authoritative.
pub fn extract_payment_state(value: &Value) -> GatewayPaymentStatus {
    let mut statuses: Vec<&str> = Vec::new();
    if let Some(s) = value["status"].as_str() {
        statuses.push(s);
    }
    if let Some(s) = value["order"]["status"].as_str() {
        statuses.push(s);
    }
    if let Some(charges) = value["charges"].as_array() {
        statuses.extend(charges.iter().filter_map(|c| c["status"].as_str()));
    }

    let paid = statuses
        .iter()
        .any(|s| PAID_MARKERS.contains(&s.to_ascii_lowercase().as_str()));

    GatewayPaymentStatus {
        paid,
        paid_at: paid.then(|| extract_paid_at(value)).flatten(),
    }
}

fn extract_paid_at(value: &Value) -> Option<DateTime<Utc>> {
    let candidates = [
        &value["charges"][0]["paid_at"],
        &value["paid_at"],
        &value["order"]["paid_at"],
    ];
    candidates
        .iter()
        .find_map(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
