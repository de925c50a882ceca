//! Factory for payment gateway instances.
//!
//! Gateways are constructed per call from freshly resolved configuration so
//! that a credential rotated in the admin panel is picked up by the very
//! next request. Nothing here may cache a resolved credential.

use std::sync::Arc;

use crate::{
    app_error::AppResult,
    application::ports::payment_gateway::{CryptoGatewayPort, PixGatewayPort},
    infra::{
        chainbox_client::ChainboxClient,
        crypto_gateway::ChainboxGateway,
        pix_gateway::PixlineGateway,
        pixline_client::PixlineClient,
        provider_config::{CHAINBOX, PIXLINE, PIXLINE_SELLER_EMAIL, ProviderConfigResolver},
    },
};

pub struct GatewayFactory {
    resolver: Arc<ProviderConfigResolver>,
    #[cfg(test)]
    pix_override: Option<Arc<dyn PixGatewayPort>>,
    #[cfg(test)]
    crypto_override: Option<Arc<dyn CryptoGatewayPort>>,
}

impl GatewayFactory {
    pub fn new(resolver: Arc<ProviderConfigResolver>) -> Self {
        Self {
            resolver,
            #[cfg(test)]
            pix_override: None,
            #[cfg(test)]
            crypto_override: None,
        }
    }

    #[cfg(test)]
    pub fn with_pix_override(mut self, gateway: Arc<dyn PixGatewayPort>) -> Self {
        self.pix_override = Some(gateway);
        self
    }

    #[cfg(test)]
    pub fn with_crypto_override(mut self, gateway: Arc<dyn CryptoGatewayPort>) -> Self {
        self.crypto_override = Some(gateway);
        self
    }

    pub async fn pix(&self) -> AppResult<Arc<dyn PixGatewayPort>> {
        #[cfg(test)]
        if let Some(gateway) = &self.pix_override {
            return Ok(gateway.clone());
        }

        let config = self.resolver.resolve(&PIXLINE).await?;
        let seller_email = self.resolver.optional_setting(PIXLINE_SELLER_EMAIL).await?;
        let client = PixlineClient::new(config.base_url, config.credential, seller_email.clone())?;
        Ok(Arc::new(PixlineGateway::new(client, seller_email)))
    }

    pub async fn crypto(&self) -> AppResult<Arc<dyn CryptoGatewayPort>> {
        #[cfg(test)]
        if let Some(gateway) = &self.crypto_override {
            return Ok(gateway.clone());
        }

        let config = self.resolver.resolve(&CHAINBOX).await?;
        let client = ChainboxClient::new(config.base_url, config.credential)?;
        Ok(Arc::new(ChainboxGateway::new(client)))
    }
}
