//! Reconciliation Service: turns provider-reported payment state into local
//! settlement, exactly once per payment.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        gateway_factory::GatewayFactory,
        payments::{CRYPTO_REF_PREFIX, PaymentRepo},
    },
    domain::entities::payment::{Payment, PaymentStatus},
};

/// Minimum share of the expected crypto amount that must have arrived for a
/// payment to count as paid. Covers network-fee deltas.
fn crypto_amount_tolerance() -> Decimal {
    Decimal::new(95, 2) // 0.95
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    Paid,
    Pending,
}

pub struct ReconciliationUseCases {
    payment_repo: Arc<dyn PaymentRepo>,
    gateways: Arc<GatewayFactory>,
}

impl ReconciliationUseCases {
    pub fn new(payment_repo: Arc<dyn PaymentRepo>, gateways: Arc<GatewayFactory>) -> Self {
        Self {
            payment_repo,
            gateways,
        }
    }

    pub async fn check_and_settle(
        &self,
        payment_id: Uuid,
        requesting_user_id: Uuid,
    ) -> AppResult<SettlementOutcome> {
        let payment = self
            .payment_repo
            .get_by_id(payment_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if payment.user_id != requesting_user_id {
            return Err(AppError::Forbidden);
        }

        // Idempotent no-op: a settled payment never hits the provider again.
        if payment.status == PaymentStatus::Paid {
            return Ok(SettlementOutcome::Paid);
        }
        if payment.status == PaymentStatus::Cancelled {
            return Ok(SettlementOutcome::Pending);
        }

        // The reference shape identifies the issuing provider: crypto
        // payments carry our locally synthesized reference, instant
        // transfers a provider-issued one.
        let Some(external_ref) = payment.external_ref.clone() else {
            return Ok(SettlementOutcome::Pending);
        };

        if external_ref.starts_with(CRYPTO_REF_PREFIX) {
            self.check_crypto(&payment).await
        } else {
            self.check_instant_transfer(&payment, &external_ref).await
        }
    }

    async fn check_instant_transfer(
        &self,
        payment: &Payment,
        external_ref: &str,
    ) -> AppResult<SettlementOutcome> {
        let gateway = self.gateways.pix().await?;
        let status = gateway.get_payment_status(external_ref).await?;

        if !status.paid {
            return Ok(SettlementOutcome::Pending);
        }

        let paid_at = status.paid_at.unwrap_or_else(Utc::now);
        self.payment_repo.settle(payment.id, paid_at).await?;
        Ok(SettlementOutcome::Paid)
    }

    async fn check_crypto(&self, payment: &Payment) -> AppResult<SettlementOutcome> {
        let (Some(address), Some(expected)) =
            (payment.crypto_address.as_deref(), payment.crypto_amount)
        else {
            return Ok(SettlementOutcome::Pending);
        };
        if expected <= Decimal::ZERO {
            return Ok(SettlementOutcome::Pending);
        }

        let gateway = self.gateways.crypto().await?;
        let status = gateway.get_address_status(address).await?;

        if status.received_btc < expected * crypto_amount_tolerance() {
            return Ok(SettlementOutcome::Pending);
        }

        let paid_at = status.confirmed_at.unwrap_or_else(Utc::now);
        self.payment_repo.settle(payment.id, paid_at).await?;
        Ok(SettlementOutcome::Paid)
    }
}
