//! Live BTC/BRL rate source backed by the Chainbox ticker.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    app_error::AppResult,
    application::ports::rates::RateSource,
    infra::{
        chainbox_client::ChainboxClient,
        provider_config::{CHAINBOX, ProviderConfigResolver},
    },
};

pub struct ChainboxRateSource {
    resolver: Arc<ProviderConfigResolver>,
}

impl ChainboxRateSource {
    pub fn new(resolver: Arc<ProviderConfigResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl RateSource for ChainboxRateSource {
    async fn btc_price_brl(&self) -> AppResult<Decimal> {
        // Config is resolved per lookup so a rotated key applies immediately.
        let config = self.resolver.resolve(&CHAINBOX).await?;
        let client = ChainboxClient::new(config.base_url, config.credential)?;
        client.ticker_brl().await
    }
}
