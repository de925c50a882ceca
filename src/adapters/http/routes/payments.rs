//! Payment routes: creation and status polling. Thin handlers; session
//! checks happen upstream, everything else is delegated to the use cases.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, extract::AuthedUser},
    app_error::AppResult,
    application::use_cases::reconciliation::SettlementOutcome,
    domain::entities::payment::PaymentMethod,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment))
        .route("/{id}/status", get(check_status))
}

#[derive(Deserialize)]
struct CreatePaymentPayload {
    plan_id: Uuid,
    method: PaymentMethod,
    coupon_code: Option<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    payment_id: Uuid,
    status: SettlementOutcome,
}

async fn create_payment(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Json(payload): Json<CreatePaymentPayload>,
) -> AppResult<impl IntoResponse> {
    let artifact = state
        .payments
        .create_payment(
            user_id,
            payload.plan_id,
            payload.method,
            payload.coupon_code.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(artifact)))
}

async fn check_status(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StatusResponse>> {
    let status = state.reconciliation.check_and_settle(id, user_id).await?;
    Ok(Json(StatusResponse {
        payment_id: id,
        status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::payment_gateway::GatewayPaymentStatus;
    use crate::application::use_cases::{
        currency::CurrencyConverter, gateway_factory::GatewayFactory, payments::PaymentUseCases,
        reconciliation::ReconciliationUseCases,
    };
    use crate::infra::{config::AppConfig, provider_config::ProviderConfigResolver};
    use crate::test_utils::{
        env::StaticEnv,
        factories,
        gateway_mocks::{MockCryptoGateway, MockPixGateway, MockRateSource},
        store::InMemoryStore,
    };
    use axum_test::TestServer;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct Harness {
        store: Arc<InMemoryStore>,
        pix: Arc<MockPixGateway>,
        server: TestServer,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let pix = Arc::new(MockPixGateway::new());
        let crypto = Arc::new(MockCryptoGateway::new());
        let resolver = Arc::new(ProviderConfigResolver::new(
            Arc::new(StaticEnv::empty()),
            store.clone(),
        ));
        let gateways = Arc::new(
            GatewayFactory::new(resolver)
                .with_pix_override(pix.clone())
                .with_crypto_override(crypto.clone()),
        );
        let converter = Arc::new(CurrencyConverter::new(Arc::new(MockRateSource::price(
            dec!(350000),
        ))));
        let payments = Arc::new(PaymentUseCases::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            gateways.clone(),
            converter,
        ));
        let reconciliation = Arc::new(ReconciliationUseCases::new(store.clone(), gateways));
        let state = AppState {
            config: Arc::new(AppConfig::for_tests()),
            payments,
            reconciliation,
        };

        let app = super::super::router().with_state(state);
        Harness {
            store,
            pix,
            server: TestServer::new(app).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_then_poll_stays_pending_until_confirmed() {
        let h = harness();
        let plan = factories::plan(dec!(49.90), 30);
        let user = factories::user();
        h.store.put_plan(plan.clone());
        h.store.put_user(user.clone());

        let response = h
            .server
            .post("/payments")
            .add_header("x-user-id", user.id.to_string())
            .json(&json!({"plan_id": plan.id, "method": "instant_transfer"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["method"], "instant_transfer");
        assert_eq!(body["qr_code"], "00020126-mock-pix-code");
        let payment_id = body["payment_id"].as_str().unwrap().to_string();

        let response = h
            .server
            .get(&format!("/payments/{payment_id}/status"))
            .add_header("x-user-id", user.id.to_string())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "pending");

        h.pix.set_status(GatewayPaymentStatus {
            paid: true,
            paid_at: None,
        });
        let response = h
            .server
            .get(&format!("/payments/{payment_id}/status"))
            .add_header("x-user-id", user.id.to_string())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "paid");
    }

    #[tokio::test]
    async fn missing_principal_header_is_rejected() {
        let h = harness();
        let plan = factories::plan(dec!(49.90), 30);
        h.store.put_plan(plan.clone());

        let response = h
            .server
            .post("/payments")
            .json(&json!({"plan_id": plan.id, "method": "crypto"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_plan_maps_to_404_with_code() {
        let h = harness();
        let user = factories::user();
        h.store.put_user(user.clone());

        let response = h
            .server
            .post("/payments")
            .add_header("x-user-id", user.id.to_string())
            .json(&json!({"plan_id": Uuid::new_v4(), "method": "crypto"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["code"], "PLAN_NOT_FOUND");
    }

    #[tokio::test]
    async fn polling_someone_elses_payment_is_forbidden() {
        let h = harness();
        let plan = factories::plan(dec!(49.90), 30);
        let user = factories::user();
        h.store.put_plan(plan.clone());
        h.store.put_user(user.clone());
        let payment = factories::pending_pix_payment(&user, &plan);
        h.store.put_payment(payment.clone());

        let response = h
            .server
            .get(&format!("/payments/{}/status", payment.id))
            .add_header("x-user-id", Uuid::new_v4().to_string())
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}
