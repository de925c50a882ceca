use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::app_error::AppResult;

/// Live exchange-rate source for the settlement asset.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Current BTC price in BRL.
    async fn btc_price_brl(&self) -> AppResult<Decimal>;
}
