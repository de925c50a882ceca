use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        payment_gateway::{
            AddressStatus, CryptoArtifact, CryptoGatewayPort, CryptoIntent, GatewayPaymentStatus,
            PixArtifact, PixGatewayPort, PixOrderIntent,
        },
        rates::RateSource,
    },
};

// ============================================================================
// MockPixGateway
// ============================================================================

pub struct MockPixGateway {
    last_intent: Mutex<Option<PixOrderIntent>>,
    fail_with: Mutex<Option<AppError>>,
    status: Mutex<GatewayPaymentStatus>,
    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl MockPixGateway {
    pub fn new() -> Self {
        Self {
            last_intent: Mutex::new(None),
            fail_with: Mutex::new(None),
            status: Mutex::new(GatewayPaymentStatus::default()),
            create_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_with(&self, err: AppError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    pub fn set_status(&self, status: GatewayPaymentStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn last_intent(&self) -> Option<PixOrderIntent> {
        self.last_intent.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::Relaxed)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::Relaxed)
    }
}

impl Default for MockPixGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PixGatewayPort for MockPixGateway {
    async fn create_payment(&self, intent: &PixOrderIntent) -> AppResult<PixArtifact> {
        *self.last_intent.lock().unwrap() = Some(intent.clone());
        let call = self.create_calls.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(err) = self.fail_with.lock().unwrap().take() {
            return Err(err);
        }

        Ok(PixArtifact {
            external_ref: format!("ORDE_MOCK_{call}"),
            qr_code: "00020126-mock-pix-code".to_string(),
            qr_code_image: Some("aW1hZ2U=".to_string()),
            expires_at: Utc::now() + Duration::minutes(30),
        })
    }

    async fn get_payment_status(&self, _external_ref: &str) -> AppResult<GatewayPaymentStatus> {
        self.status_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.status.lock().unwrap().clone())
    }
}

// ============================================================================
// MockCryptoGateway
// ============================================================================

pub struct MockCryptoGateway {
    fail_times: AtomicUsize,
    received: Mutex<Decimal>,
    confirmed_at: Mutex<Option<DateTime<Utc>>>,
    create_calls: AtomicUsize,
}

impl MockCryptoGateway {
    pub fn new() -> Self {
        Self {
            fail_times: AtomicUsize::new(0),
            received: Mutex::new(Decimal::ZERO),
            confirmed_at: Mutex::new(None),
            create_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` create calls with `ServiceUnavailable`.
    pub fn fail_times(&self, n: usize) {
        self.fail_times.store(n, Ordering::Relaxed);
    }

    pub fn set_received(&self, amount: Decimal) {
        *self.received.lock().unwrap() = amount;
    }

    pub fn set_confirmed_at(&self, at: Option<DateTime<Utc>>) {
        *self.confirmed_at.lock().unwrap() = at;
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::Relaxed)
    }
}

impl Default for MockCryptoGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CryptoGatewayPort for MockCryptoGateway {
    async fn create_payment(&self, intent: &CryptoIntent) -> AppResult<CryptoArtifact> {
        self.create_calls.fetch_add(1, Ordering::Relaxed);

        let remaining = self.fail_times.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_times.store(remaining - 1, Ordering::Relaxed);
            return Err(AppError::ServiceUnavailable);
        }

        let address = format!("bc1qmock{}", &intent.payment_id.simple().to_string()[..8]);
        Ok(CryptoArtifact {
            payment_uri: format!(
                "bitcoin:{address}?amount={}",
                intent.amount_btc.normalize()
            ),
            address,
            network: "BTC".to_string(),
            degraded: false,
        })
    }

    async fn get_address_status(&self, _address: &str) -> AppResult<AddressStatus> {
        Ok(AddressStatus {
            received_btc: *self.received.lock().unwrap(),
            confirmed_at: *self.confirmed_at.lock().unwrap(),
        })
    }
}

// ============================================================================
// MockRateSource
// ============================================================================

pub struct MockRateSource {
    price: Option<Decimal>,
}

impl MockRateSource {
    pub fn price(price: Decimal) -> Self {
        Self { price: Some(price) }
    }

    pub fn failing() -> Self {
        Self { price: None }
    }
}

#[async_trait]
impl RateSource for MockRateSource {
    async fn btc_price_brl(&self) -> AppResult<Decimal> {
        match self.price {
            Some(price) => Ok(price),
            None => Err(AppError::ServiceUnavailable),
        }
    }
}
