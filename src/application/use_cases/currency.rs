//! Currency Conversion Service: BRL plan prices into the BTC settlement
//! amount the crypto gateway charges.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;

use crate::application::ports::rates::RateSource;

/// Settlement amounts are quoted to satoshi precision.
const BTC_SCALE: u32 = 8;

pub struct CurrencyConverter {
    rates: Arc<dyn RateSource>,
    fallback_warned: AtomicBool,
}

impl CurrencyConverter {
    pub fn new(rates: Arc<dyn RateSource>) -> Self {
        Self {
            rates,
            fallback_warned: AtomicBool::new(false),
        }
    }

    /// Convert a BRL amount to BTC. The live rate is preferred; any failure
    /// there drops to the fixed reference table, trading accuracy for
    /// availability. Settlement never re-validates against a live rate, so
    /// the fallback must stay deterministic.
    pub async fn convert_brl_to_btc(&self, amount_brl: Decimal) -> Decimal {
        match self.rates.btc_price_brl().await {
            Ok(price) if price > Decimal::ZERO => (amount_brl / price).round_dp(BTC_SCALE),
            Ok(price) => self.convert_with_fallback(amount_brl, &format!("non-positive rate {price}")),
            Err(err) => self.convert_with_fallback(amount_brl, &err.to_string()),
        }
    }

    fn convert_with_fallback(&self, amount_brl: Decimal, reason: &str) -> Decimal {
        if !self.fallback_warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                reason = reason,
                "live rate lookup failed, using the fixed reference rate table"
            );
        } else {
            tracing::debug!(reason = reason, "using the fixed reference rate table");
        }
        let usd = amount_brl * brl_usd_reference_rate();
        (usd / btc_usd_reference_price()).round_dp(BTC_SCALE)
    }

    #[cfg(test)]
    pub fn used_fallback(&self) -> bool {
        self.fallback_warned.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub fn reset_warnings(&self) {
        self.fallback_warned.store(false, Ordering::Relaxed);
    }
}

/// Approximate BRL→USD reference rate.
fn brl_usd_reference_rate() -> Decimal {
    Decimal::new(185, 3) // 0.185
}

/// Approximate USD price of one BTC.
fn btc_usd_reference_price() -> Decimal {
    Decimal::from(65_000)
}
