//! Payment Creation Orchestrator: the front door of the billing core.
//!
//! Creation is idempotent per (user, plan, method): the store enforces at
//! most one pending payment per triple, and a uniqueness conflict is
//! resolved by re-querying for the record the concurrent winner created.
//! That conflict-then-reread path is the concurrency mechanism, not an
//! error case.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{CryptoIntent, CustomerIdentity, PixOrderIntent},
    application::use_cases::{currency::CurrencyConverter, gateway_factory::GatewayFactory},
    domain::entities::{
        coupon::Coupon,
        payment::{Payment, PaymentMethod},
        plan::Plan,
        user::UserProfile,
    },
    infra::crypto_gateway::{BTC_NETWORK, payment_uri},
};

/// Prefix of the locally synthesized reference carried by crypto payments.
/// Instant-transfer references are provider-issued and never look like this.
pub const CRYPTO_REF_PREFIX: &str = "chbx_";

// ============================================================================
// Repo Traits
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub external_ref: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_image: Option<String>,
    pub crypto_amount: Option<Decimal>,
    pub expires_at: Option<DateTime<Utc>>,
    pub coupon_id: Option<Uuid>,
}

#[async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Payment>>;

    async fn find_pending(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        method: PaymentMethod,
    ) -> AppResult<Option<Payment>>;

    async fn find_any_pending_for_user(&self, user_id: Uuid) -> AppResult<Option<Payment>>;

    /// Insert a pending payment. Fails with `AppError::Conflict` when the
    /// one-pending-per-(user, plan, method) constraint is violated.
    async fn create(&self, input: &NewPayment) -> AppResult<Payment>;

    async fn set_crypto_artifact(
        &self,
        id: Uuid,
        external_ref: &str,
        address: &str,
        network: &str,
        crypto_amount: Decimal,
    ) -> AppResult<()>;

    /// Settle a pending payment as one atomic unit: mark it paid, consume
    /// the attached coupon, and extend the user's plan. Returns false when
    /// the payment was not pending (already settled or cancelled), in which
    /// case nothing was written.
    async fn settle(&self, payment_id: Uuid, paid_at: DateTime<Utc>) -> AppResult<bool>;
}

#[async_trait]
pub trait PlanRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>>;
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<UserProfile>>;

    async fn set_tax_id(&self, user_id: Uuid, tax_id: &str) -> AppResult<()>;
}

#[async_trait]
pub trait CouponRepo: Send + Sync {
    async fn get_by_code(&self, code: &str) -> AppResult<Option<Coupon>>;
}

// ============================================================================
// Artifact
// ============================================================================

/// What the caller gets back from payment creation, keyed by method.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentArtifact {
    InstantTransfer {
        payment_id: Uuid,
        amount: Decimal,
        qr_code: String,
        qr_code_image: Option<String>,
        expires_at: DateTime<Utc>,
    },
    Crypto {
        payment_id: Uuid,
        amount: Decimal,
        crypto_amount: Decimal,
        address: String,
        network: String,
        payment_uri: String,
    },
}

impl PaymentArtifact {
    pub fn payment_id(&self) -> Uuid {
        match self {
            PaymentArtifact::InstantTransfer { payment_id, .. } => *payment_id,
            PaymentArtifact::Crypto { payment_id, .. } => *payment_id,
        }
    }
}

// ============================================================================
// Use Cases
// ============================================================================

pub struct PaymentUseCases {
    payment_repo: Arc<dyn PaymentRepo>,
    plan_repo: Arc<dyn PlanRepo>,
    user_repo: Arc<dyn UserRepo>,
    coupon_repo: Arc<dyn CouponRepo>,
    gateways: Arc<GatewayFactory>,
    converter: Arc<CurrencyConverter>,
}

impl PaymentUseCases {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepo>,
        plan_repo: Arc<dyn PlanRepo>,
        user_repo: Arc<dyn UserRepo>,
        coupon_repo: Arc<dyn CouponRepo>,
        gateways: Arc<GatewayFactory>,
        converter: Arc<CurrencyConverter>,
    ) -> Self {
        Self {
            payment_repo,
            plan_repo,
            user_repo,
            coupon_repo,
            gateways,
            converter,
        }
    }

    pub async fn create_payment(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        method: PaymentMethod,
        coupon_code: Option<&str>,
    ) -> AppResult<PaymentArtifact> {
        let plan = self
            .plan_repo
            .get_by_id(plan_id)
            .await?
            .ok_or(AppError::PlanNotFound)?;
        let user = self
            .user_repo
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let coupon = self.resolve_coupon(coupon_code, plan.price).await?;
        let amount = coupon
            .as_ref()
            .map(|c| c.apply(plan.price))
            .unwrap_or(plan.price);
        let coupon_id = coupon.as_ref().map(|c| c.id);

        match method {
            PaymentMethod::InstantTransfer => {
                self.create_pix_payment(&user, &plan, amount, coupon_id).await
            }
            PaymentMethod::Crypto => {
                self.create_crypto_payment(&user, &plan, amount, coupon_id)
                    .await
            }
        }
    }

    async fn resolve_coupon(
        &self,
        code: Option<&str>,
        order_amount: Decimal,
    ) -> AppResult<Option<Coupon>> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let coupon = self
            .coupon_repo
            .get_by_code(code)
            .await?
            .ok_or_else(|| AppError::InvalidInput("unknown coupon code".to_string()))?;

        if coupon.is_expired(Utc::now()) {
            return Err(AppError::InvalidInput("coupon has expired".to_string()));
        }
        if coupon.is_exhausted() {
            return Err(AppError::InvalidInput(
                "coupon usage limit reached".to_string(),
            ));
        }
        if order_amount < coupon.min_amount {
            return Err(AppError::InvalidInput(format!(
                "coupon requires a minimum order of {}",
                coupon.min_amount
            )));
        }

        Ok(Some(coupon))
    }

    // ========================================================================
    // Instant transfer
    // ========================================================================

    async fn create_pix_payment(
        &self,
        user: &UserProfile,
        plan: &Plan,
        amount: Decimal,
        coupon_id: Option<Uuid>,
    ) -> AppResult<PaymentArtifact> {
        // Config problems surface as-is: they carry the setting name and
        // remediation, which is what the storefront shows the admin.
        let gateway = self.gateways.pix().await?;

        let tax_id = self.ensure_tax_id(user).await;
        let payment_id = Uuid::new_v4();
        let intent = PixOrderIntent {
            reference_id: payment_id.to_string(),
            amount,
            customer: CustomerIdentity {
                name: user.name.clone(),
                tax_id,
                email: user.email.clone(),
            },
            item_name: plan.name.clone(),
        };

        let artifact = gateway.create_payment(&intent).await?;

        let new_payment = NewPayment {
            id: payment_id,
            user_id: user.id,
            plan_id: plan.id,
            amount,
            method: PaymentMethod::InstantTransfer,
            external_ref: Some(artifact.external_ref),
            qr_code: Some(artifact.qr_code),
            qr_code_image: artifact.qr_code_image,
            crypto_amount: None,
            expires_at: Some(artifact.expires_at),
            coupon_id,
        };

        let payment = match self.payment_repo.create(&new_payment).await {
            Ok(payment) => payment,
            Err(AppError::Conflict) => self
                .payment_repo
                .find_pending(user.id, plan.id, PaymentMethod::InstantTransfer)
                .await?
                .ok_or(AppError::Conflict)?,
            Err(err) => return Err(err),
        };

        pix_artifact_from(&payment)
    }

    /// PIX orders require a buyer tax id. When the user never stored one we
    /// synthesize a value and persist it best-effort: the payment proceeds
    /// with the in-memory value even if the write fails.
    async fn ensure_tax_id(&self, user: &UserProfile) -> String {
        if let Some(tax_id) = user
            .tax_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            return tax_id.to_string();
        }

        let synthesized = synthesize_tax_id();
        if let Err(err) = self.user_repo.set_tax_id(user.id, &synthesized).await {
            tracing::warn!(
                user_id = %user.id,
                error = %err,
                "failed to persist synthesized tax id"
            );
        }
        synthesized
    }

    // ========================================================================
    // Crypto
    // ========================================================================

    async fn create_crypto_payment(
        &self,
        user: &UserProfile,
        plan: &Plan,
        amount: Decimal,
        coupon_id: Option<Uuid>,
    ) -> AppResult<PaymentArtifact> {
        match self.crypto_attempt(user, plan, amount, coupon_id).await {
            Ok(artifact) => Ok(artifact),
            Err(err) => {
                tracing::warn!(
                    user_id = %user.id,
                    plan_id = %plan.id,
                    error = %err,
                    "crypto payment attempt failed, retrying once with idempotent lookup"
                );
                self.crypto_attempt(user, plan, amount, coupon_id).await
            }
        }
    }

    async fn crypto_attempt(
        &self,
        user: &UserProfile,
        plan: &Plan,
        amount: Decimal,
        coupon_id: Option<Uuid>,
    ) -> AppResult<PaymentArtifact> {
        if let Some(existing) = self
            .payment_repo
            .find_pending(user.id, plan.id, PaymentMethod::Crypto)
            .await?
        {
            return self.crypto_artifact_for(existing, plan).await;
        }

        let crypto_amount = self.converter.convert_brl_to_btc(amount).await;
        let new_payment = NewPayment {
            id: Uuid::new_v4(),
            user_id: user.id,
            plan_id: plan.id,
            amount,
            method: PaymentMethod::Crypto,
            external_ref: None,
            qr_code: None,
            qr_code_image: None,
            crypto_amount: Some(crypto_amount),
            expires_at: None,
            coupon_id,
        };

        let payment = match self.payment_repo.create(&new_payment).await {
            Ok(payment) => payment,
            Err(AppError::Conflict) => {
                // A concurrent request won the race; converge on its record
                // instead of surfacing a duplicate-payment error.
                match self
                    .payment_repo
                    .find_pending(user.id, plan.id, PaymentMethod::Crypto)
                    .await?
                {
                    Some(payment) => payment,
                    // Last-resort valve: reuse whatever pending payment the
                    // user has, even one created for another method.
                    None => self
                        .payment_repo
                        .find_any_pending_for_user(user.id)
                        .await?
                        .ok_or(AppError::Conflict)?,
                }
            }
            Err(err) => return Err(err),
        };

        self.crypto_artifact_for(payment, plan).await
    }

    async fn crypto_artifact_for(
        &self,
        payment: Payment,
        plan: &Plan,
    ) -> AppResult<PaymentArtifact> {
        let crypto_amount = match payment.crypto_amount {
            Some(amount) => amount,
            None => self.converter.convert_brl_to_btc(payment.amount).await,
        };

        // Reuse the stored address when the payment already has one.
        if let Some(address) = payment.crypto_address.clone() {
            let network = payment
                .crypto_network
                .clone()
                .unwrap_or_else(|| BTC_NETWORK.to_string());
            return Ok(PaymentArtifact::Crypto {
                payment_id: payment.id,
                amount: payment.amount,
                crypto_amount,
                payment_uri: payment_uri(&address, crypto_amount, &plan.name),
                address,
                network,
            });
        }

        let gateway = self.gateways.crypto().await?;
        let artifact = gateway
            .create_payment(&CryptoIntent {
                payment_id: payment.id,
                amount_btc: crypto_amount,
                label: plan.name.clone(),
            })
            .await?;

        let external_ref = format!("{CRYPTO_REF_PREFIX}{}", payment.id);
        self.payment_repo
            .set_crypto_artifact(
                payment.id,
                &external_ref,
                &artifact.address,
                &artifact.network,
                crypto_amount,
            )
            .await?;

        Ok(PaymentArtifact::Crypto {
            payment_id: payment.id,
            amount: payment.amount,
            crypto_amount,
            address: artifact.address,
            network: artifact.network,
            payment_uri: artifact.payment_uri,
        })
    }
}

fn pix_artifact_from(payment: &Payment) -> AppResult<PaymentArtifact> {
    let qr_code = payment.qr_code.clone().ok_or_else(|| {
        AppError::Internal("instant transfer payment is missing its QR payload".to_string())
    })?;
    Ok(PaymentArtifact::InstantTransfer {
        payment_id: payment.id,
        amount: payment.amount,
        qr_code,
        qr_code_image: payment.qr_code_image.clone(),
        expires_at: payment.expires_at.unwrap_or_else(Utc::now),
    })
}

/// CPF-shaped 11-digit value for users who never stored a tax id.
pub fn synthesize_tax_id() -> String {
    let mut rng = rand::thread_rng();
    (0..11).map(|_| rng.gen_range(0..10).to_string()).collect()
}
