use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::use_cases::{
        currency::CurrencyConverter,
        gateway_factory::GatewayFactory,
        payments::{CouponRepo, PaymentRepo, PaymentUseCases, PlanRepo, UserRepo},
        reconciliation::ReconciliationUseCases,
    },
    infra::{
        config::AppConfig,
        db::init_db,
        provider_config::{ProcessEnv, ProviderConfigResolver, SettingsRepo},
        rate_client::ChainboxRateSource,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url).await?;
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let payment_repo = postgres_arc.clone() as Arc<dyn PaymentRepo>;
    let plan_repo = postgres_arc.clone() as Arc<dyn PlanRepo>;
    let user_repo = postgres_arc.clone() as Arc<dyn UserRepo>;
    let coupon_repo = postgres_arc.clone() as Arc<dyn CouponRepo>;
    let settings_repo = postgres_arc.clone() as Arc<dyn SettingsRepo>;

    let resolver = Arc::new(ProviderConfigResolver::new(
        Arc::new(ProcessEnv),
        settings_repo,
    ));
    let gateways = Arc::new(GatewayFactory::new(resolver.clone()));
    let converter = Arc::new(CurrencyConverter::new(Arc::new(ChainboxRateSource::new(
        resolver,
    ))));

    let payments = PaymentUseCases::new(
        payment_repo.clone(),
        plan_repo,
        user_repo,
        coupon_repo,
        gateways.clone(),
        converter,
    );

    let reconciliation = ReconciliationUseCases::new(payment_repo, gateways);

    Ok(AppState {
        config: Arc::new(config),
        payments: Arc::new(payments),
        reconciliation: Arc::new(reconciliation),
    })
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "pagcore=debug,tower_http=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
