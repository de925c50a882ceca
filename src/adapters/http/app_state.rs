use std::sync::Arc;

use crate::{
    application::use_cases::{payments::PaymentUseCases, reconciliation::ReconciliationUseCases},
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub payments: Arc<PaymentUseCases>,
    pub reconciliation: Arc<ReconciliationUseCases>,
}
