//! Raw HTTP client for the Chainbox wallet gateway: receiving-address
//! derivation, address balance queries, and the BTC/BRL ticker.

use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    infra::http_client::{
        classify_error_status, classify_transport_error, provider_message, try_build_client,
    },
};

pub struct ChainboxClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl ChainboxClient {
    pub fn new(base_url: Url, api_key: SecretString) -> AppResult<Self> {
        let client = try_build_client()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    pub async fn create_address(
        &self,
        external_id: &str,
        amount_btc: Decimal,
    ) -> AppResult<ChainboxAddress> {
        let request = ChainboxAddressRequest {
            external_id: external_id.to_string(),
            expected_amount: amount_btc,
        };

        let response = self
            .client
            .post(self.endpoint("addresses"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        self.handle_response(response).await
    }

    pub async fn get_address(&self, address: &str) -> AppResult<ChainboxAddressStatus> {
        let response = self
            .client
            .get(self.endpoint(&format!("addresses/{address}")))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(classify_transport_error)?;

        self.handle_response(response).await
    }

    pub async fn ticker_brl(&self) -> AppResult<Decimal> {
        let response = self
            .client
            .get(self.endpoint("ticker/btc-brl"))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let ticker: ChainboxTicker = self.handle_response(response).await?;
        Ok(ticker.price)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Chainbox API error");
            return Err(classify_error_status(status, provider_message(&body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "failed to parse Chainbox response");
            AppError::Internal(format!("failed to parse Chainbox response: {e}"))
        })
    }
}

#[derive(Debug, Serialize)]
struct ChainboxAddressRequest {
    external_id: String,
    expected_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ChainboxAddress {
    pub address: String,
    #[serde(default = "default_network")]
    pub network: String,
}

#[derive(Debug, Deserialize)]
pub struct ChainboxAddressStatus {
    #[serde(default)]
    pub received: Decimal,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ChainboxTicker {
    price: Decimal,
}

fn default_network() -> String {
    "BTC".to_string()
}
