//! PIX adapter: implements the gateway port on top of `PixlineClient`.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{
        GatewayPaymentStatus, PixArtifact, PixGatewayPort, PixOrderIntent,
    },
    infra::pixline_client::{
        PixlineAmount, PixlineClient, PixlineCustomer, PixlineItem, PixlineOrderRequest,
        PixlineQrRequest, extract_order_id, extract_payment_state, extract_qr,
    },
};

/// Fixed validity window for issued QR codes.
pub const QR_CODE_TTL_MINUTES: i64 = 30;

pub struct PixlineGateway {
    client: PixlineClient,
    seller_email: Option<String>,
}

impl PixlineGateway {
    pub fn new(client: PixlineClient, seller_email: Option<String>) -> Self {
        Self {
            client,
            seller_email,
        }
    }
}

#[async_trait]
impl PixGatewayPort for PixlineGateway {
    async fn create_payment(&self, intent: &PixOrderIntent) -> AppResult<PixArtifact> {
        // Pixline rejects orders where the buyer email equals the seller
        // account email. Catch it here instead of burning a round trip that
        // is certain to fail.
        if let Some(seller) = &self.seller_email {
            if intent.customer.email.eq_ignore_ascii_case(seller) {
                return Err(AppError::ProviderRejected(
                    "buyer email must differ from the seller account email".to_string(),
                ));
            }
        }

        let expires_at = Utc::now() + Duration::minutes(QR_CODE_TTL_MINUTES);
        let amount_centavos = to_centavos(intent.amount);

        let request = PixlineOrderRequest {
            reference_id: intent.reference_id.clone(),
            customer: PixlineCustomer {
                name: intent.customer.name.clone(),
                tax_id: intent.customer.tax_id.clone(),
                email: intent.customer.email.clone(),
            },
            items: vec![PixlineItem {
                name: intent.item_name.clone(),
                quantity: 1,
                unit_amount: amount_centavos,
            }],
            qr_codes: vec![PixlineQrRequest {
                amount: PixlineAmount {
                    value: amount_centavos,
                },
                expiration_date: expires_at.to_rfc3339(),
            }],
        };

        let response = self.client.create_order(&request).await?;

        let qr = extract_qr(&response).ok_or_else(|| {
            AppError::ProviderRejected("order response did not include a QR code".to_string())
        })?;
        let external_ref =
            extract_order_id(&response).unwrap_or_else(|| intent.reference_id.clone());

        tracing::info!(
            reference_id = %intent.reference_id,
            external_ref = %external_ref,
            "created Pixline order"
        );

        Ok(PixArtifact {
            external_ref,
            qr_code: qr.text,
            qr_code_image: qr.image_base64,
            expires_at,
        })
    }

    async fn get_payment_status(&self, external_ref: &str) -> AppResult<GatewayPaymentStatus> {
        let response = self.client.get_order(external_ref).await?;
        Ok(extract_payment_state(&response))
    }
}

fn to_centavos(amount: Decimal) -> i64 {
    (amount.round_dp(2) * Decimal::from(100)).to_i64().unwrap_or(0)
}
