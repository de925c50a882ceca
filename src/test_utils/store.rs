//! One in-memory store implementing every repo trait, mirroring the
//! constraints the Postgres schema enforces (notably the single-pending
//! uniqueness rule and the atomic settlement).

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::payments::{
        CouponRepo, NewPayment, PaymentRepo, PlanRepo, UserRepo,
    },
    domain::entities::{
        coupon::Coupon,
        payment::{Payment, PaymentMethod, PaymentStatus},
        plan::Plan,
        user::UserProfile,
    },
    infra::provider_config::SettingsRepo,
};

#[derive(Default)]
pub struct InMemoryStore {
    payments: Mutex<HashMap<Uuid, Payment>>,
    plans: Mutex<HashMap<Uuid, Plan>>,
    users: Mutex<HashMap<Uuid, UserProfile>>,
    coupons: Mutex<HashMap<Uuid, Coupon>>,
    settings: Mutex<HashMap<String, String>>,
    fail_tax_id_persist: AtomicBool,
    conflict_create_with: Mutex<Option<Payment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_plan(&self, plan: Plan) {
        self.plans.lock().unwrap().insert(plan.id, plan);
    }

    pub fn put_user(&self, user: UserProfile) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn put_coupon(&self, coupon: Coupon) {
        self.coupons.lock().unwrap().insert(coupon.id, coupon);
    }

    pub fn put_payment(&self, payment: Payment) {
        self.payments.lock().unwrap().insert(payment.id, payment);
    }

    pub fn put_setting(&self, key: &str, value: &str) {
        self.settings
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn payment(&self, id: Uuid) -> Option<Payment> {
        self.payments.lock().unwrap().get(&id).cloned()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.payments.lock().unwrap().values().cloned().collect()
    }

    pub fn user(&self, id: Uuid) -> Option<UserProfile> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    pub fn coupon(&self, id: Uuid) -> Option<Coupon> {
        self.coupons.lock().unwrap().get(&id).cloned()
    }

    /// Make the next tax-id write fail, to exercise the best-effort path.
    pub fn fail_next_tax_id_persist(&self) {
        self.fail_tax_id_persist.store(true, Ordering::Relaxed);
    }

    /// Simulate losing a creation race: the next `create` call inserts the
    /// given competitor row and fails with `Conflict`.
    pub fn conflict_next_create_with(&self, competitor: Payment) {
        *self.conflict_create_with.lock().unwrap() = Some(competitor);
    }
}

#[async_trait]
impl PaymentRepo for InMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Payment>> {
        Ok(self.payments.lock().unwrap().get(&id).cloned())
    }

    async fn find_pending(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        method: PaymentMethod,
    ) -> AppResult<Option<Payment>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .values()
            .find(|p| {
                p.user_id == user_id
                    && p.plan_id == plan_id
                    && p.method == method
                    && p.status == PaymentStatus::Pending
            })
            .cloned())
    }

    async fn find_any_pending_for_user(&self, user_id: Uuid) -> AppResult<Option<Payment>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .values()
            .find(|p| p.user_id == user_id && p.status == PaymentStatus::Pending)
            .cloned())
    }

    async fn create(&self, input: &NewPayment) -> AppResult<Payment> {
        if let Some(competitor) = self.conflict_create_with.lock().unwrap().take() {
            self.payments
                .lock()
                .unwrap()
                .insert(competitor.id, competitor);
            return Err(AppError::Conflict);
        }

        let mut payments = self.payments.lock().unwrap();
        let duplicate = payments.values().any(|p| {
            p.user_id == input.user_id
                && p.plan_id == input.plan_id
                && p.method == input.method
                && p.status == PaymentStatus::Pending
        });
        if duplicate {
            return Err(AppError::Conflict);
        }

        let payment = Payment {
            id: input.id,
            user_id: input.user_id,
            plan_id: input.plan_id,
            amount: input.amount,
            method: input.method,
            status: PaymentStatus::Pending,
            external_ref: input.external_ref.clone(),
            qr_code: input.qr_code.clone(),
            qr_code_image: input.qr_code_image.clone(),
            crypto_address: None,
            crypto_network: None,
            crypto_amount: input.crypto_amount,
            expires_at: input.expires_at,
            paid_at: None,
            coupon_id: input.coupon_id,
            created_at: Utc::now(),
        };
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn set_crypto_artifact(
        &self,
        id: Uuid,
        external_ref: &str,
        address: &str,
        network: &str,
        crypto_amount: Decimal,
    ) -> AppResult<()> {
        let mut payments = self.payments.lock().unwrap();
        let payment = payments.get_mut(&id).ok_or(AppError::NotFound)?;
        payment.external_ref = Some(external_ref.to_string());
        payment.crypto_address = Some(address.to_string());
        payment.crypto_network = Some(network.to_string());
        payment.crypto_amount = Some(crypto_amount);
        Ok(())
    }

    async fn settle(&self, payment_id: Uuid, paid_at: DateTime<Utc>) -> AppResult<bool> {
        let (user_id, plan_id, coupon_id) = {
            let mut payments = self.payments.lock().unwrap();
            let payment = payments.get_mut(&payment_id).ok_or(AppError::NotFound)?;
            if payment.status != PaymentStatus::Pending {
                return Ok(false);
            }
            payment.status = PaymentStatus::Paid;
            payment.paid_at = Some(paid_at);
            (payment.user_id, payment.plan_id, payment.coupon_id)
        };

        let duration_days = self
            .plans
            .lock()
            .unwrap()
            .get(&plan_id)
            .ok_or(AppError::NotFound)?
            .duration_days;

        if let Some(coupon_id) = coupon_id {
            if let Some(coupon) = self.coupons.lock().unwrap().get_mut(&coupon_id) {
                coupon.uses += 1;
            }
        }

        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            let now = Utc::now();
            let base = user.plan_expires_at.filter(|at| *at > now).unwrap_or(now);
            user.plan_expires_at = Some(base + Duration::days(duration_days as i64));
            user.plan_id = Some(plan_id);
        }

        Ok(true)
    }
}

#[async_trait]
impl PlanRepo for InMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        Ok(self.plans.lock().unwrap().get(&id).cloned())
    }
}

#[async_trait]
impl UserRepo for InMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn set_tax_id(&self, user_id: Uuid, tax_id: &str) -> AppResult<()> {
        if self.fail_tax_id_persist.swap(false, Ordering::Relaxed) {
            return Err(AppError::Database("simulated write failure".to_string()));
        }
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::NotFound)?;
        user.tax_id = Some(tax_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl CouponRepo for InMemoryStore {
    async fn get_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        Ok(self
            .coupons
            .lock()
            .unwrap()
            .values()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .cloned())
    }
}

#[async_trait]
impl SettingsRepo for InMemoryStore {
    async fn get_setting(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.settings.lock().unwrap().get(key).cloned())
    }
}
