use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::domain::entities::{
    coupon::{Coupon, CouponKind},
    payment::{Payment, PaymentMethod, PaymentStatus},
    plan::Plan,
    user::UserProfile,
};

pub fn plan(price: Decimal, duration_days: i32) -> Plan {
    Plan {
        id: Uuid::new_v4(),
        name: "Plano Mensal".to_string(),
        price,
        duration_days,
        generation_quota: 50,
    }
}

pub fn user() -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        name: "Ana Souza".to_string(),
        email: "ana@example.com".to_string(),
        tax_id: Some("39053344705".to_string()),
        plan_id: None,
        plan_expires_at: None,
        bonus_generations: 0,
    }
}

pub fn coupon(code: &str, kind: CouponKind, value: Decimal) -> Coupon {
    Coupon {
        id: Uuid::new_v4(),
        code: code.to_string(),
        kind,
        value,
        uses: 12,
        max_uses: 50,
        min_amount: Decimal::ZERO,
        expires_at: None,
    }
}

pub fn pending_pix_payment(user: &UserProfile, plan: &Plan) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        user_id: user.id,
        plan_id: plan.id,
        amount: plan.price,
        method: PaymentMethod::InstantTransfer,
        status: PaymentStatus::Pending,
        external_ref: Some("ORDE_STORED_1".to_string()),
        qr_code: Some("00020126-stored-pix-code".to_string()),
        qr_code_image: None,
        crypto_address: None,
        crypto_network: None,
        crypto_amount: None,
        expires_at: Some(Utc::now() + Duration::minutes(30)),
        paid_at: None,
        coupon_id: None,
        created_at: Utc::now(),
    }
}

pub fn pending_crypto_payment(user: &UserProfile, plan: &Plan) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        user_id: user.id,
        plan_id: plan.id,
        amount: plan.price,
        method: PaymentMethod::Crypto,
        status: PaymentStatus::Pending,
        external_ref: None,
        qr_code: None,
        qr_code_image: None,
        crypto_address: None,
        crypto_network: None,
        crypto_amount: Some(dec!(0.00014257)),
        expires_at: None,
        paid_at: None,
        coupon_id: None,
        created_at: Utc::now(),
    }
}
