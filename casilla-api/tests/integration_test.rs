use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use casilla_api::{app, AppState};
use casilla_consolidation::CaptureService;
use casilla_core::payment::MockPaymentGateway;
use casilla_core::rates::{ExchangeRateSource, FixedRateSource};
use casilla_gex::{FeeSchedule, QuoteService};
use casilla_store::MemoryStore;

fn test_state() -> AppState {
    state_with_rates(Arc::new(FixedRateSource::new(20.5)), Duration::from_secs(300))
}

fn state_with_rates(source: Arc<dyn ExchangeRateSource>, rate_ttl: Duration) -> AppState {
    let store = Arc::new(MemoryStore::new());
    AppState {
        packages: store.clone(),
        consolidations: store.clone(),
        warranties: store.clone(),
        quotes: Arc::new(QuoteService::new(
            source,
            FeeSchedule::default(),
            rate_ttl,
            Duration::from_secs(1),
        )),
        capture: Arc::new(CaptureService::new(
            Arc::new(MockPaymentGateway),
            Duration::from_secs(5),
        )),
    }
}

/// FX feed whose rate can move between requests
struct AdjustableRateSource {
    rate: Mutex<f64>,
}

impl AdjustableRateSource {
    fn new(rate: f64) -> Self {
        Self {
            rate: Mutex::new(rate),
        }
    }

    fn set(&self, rate: f64) {
        *self.rate.lock().unwrap() = rate;
    }
}

#[async_trait]
impl ExchangeRateSource for AdjustableRateSource {
    async fn current_rate(&self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(*self.rate.lock().unwrap())
    }
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn intake_package(router: &axum::Router, user: &str, tracking: &str) -> Uuid {
    let response = router
        .clone()
        .oneshot(post(
            "/packages",
            json!({
                "user_id": user,
                "description": "Electronics",
                "internal_tracking": tracking,
                "weight_kg": 2.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    body["id"].as_str().unwrap().parse().unwrap()
}

async fn ship_consolidation(router: &axum::Router, consolidation_id: &str) {
    for status in ["PROCESSING", "SHIPPED"] {
        let response = router
            .clone()
            .oneshot(post(
                &format!("/consolidations/{consolidation_id}/status"),
                json!({ "status": status }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_consolidation_flow() {
    let router = app(test_state());

    let a = intake_package(&router, "u1", "CSL001").await;
    let b = intake_package(&router, "u1", "CSL002").await;

    // Group both packages
    let response = router
        .clone()
        .oneshot(post(
            "/consolidations",
            json!({ "user_id": "u1", "package_ids": [a, b] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let consolidation_id = body["consolidation_id"].as_str().unwrap().to_string();

    // Overlapping request conflicts
    let response = router
        .clone()
        .oneshot(post(
            "/consolidations",
            json!({ "user_id": "u1", "package_ids": [b] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Empty selection is a validation error
    let response = router
        .clone()
        .oneshot(post(
            "/consolidations",
            json!({ "user_id": "u1", "package_ids": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Members mirror the pending consolidation
    let response = router.clone().oneshot(get("/packages?user_id=u1")).await.unwrap();
    let body = json_body(response).await;
    for package in body.as_array().unwrap() {
        assert_eq!(
            package["consolidation_id"].as_str().unwrap(),
            consolidation_id
        );
        assert_eq!(package["consolidation_status"], "PENDING");
    }
}

#[tokio::test]
async fn test_quote_endpoint_matches_policy_example() {
    let router = app(test_state());

    let response = router
        .clone()
        .oneshot(post(
            "/gex/quote",
            json!({ "invoice_value_usd": 100000.0 / 20.5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["insured_value_mxn"].as_f64().unwrap(), 100000.0);
    assert_eq!(body["variable_fee_mxn"].as_f64().unwrap(), 5000.0);
    assert_eq!(body["fixed_fee_mxn"].as_f64().unwrap(), 625.0);
    assert_eq!(body["total_cost_mxn"].as_f64().unwrap(), 5625.0);
    assert_eq!(body["exchange_rate"].as_f64().unwrap(), 20.5);

    // Non-positive values never quote
    let response = router
        .clone()
        .oneshot(post("/gex/quote", json!({ "invoice_value_usd": 0.0 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_warranty_attachment_flow() {
    let router = app(test_state());
    let package_id = intake_package(&router, "u1", "CSL010").await;

    // Missing signature is rejected server-side
    let response = router
        .clone()
        .oneshot(post(
            "/gex/warranties/self",
            json!({
                "package_id": package_id,
                "invoice_value_usd": 500.0,
                "payment_option": "pay_now",
                "accepted_at": "2026-08-01T12:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing acceptance timestamp is rejected server-side
    let response = router
        .clone()
        .oneshot(post(
            "/gex/warranties/self",
            json!({
                "package_id": package_id,
                "invoice_value_usd": 500.0,
                "payment_option": "pay_now",
                "signature": "data:image/png;base64,AA==",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Complete submission attaches the policy
    let attach = json!({
        "package_id": package_id,
        "invoice_value_usd": 500.0,
        "payment_option": "pay_with_shipment",
        "signature": "data:image/png;base64,AA==",
        "accepted_at": "2026-08-01T12:00:00Z",
    });
    let response = router
        .clone()
        .oneshot(post("/gex/warranties/self", attach.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["exchange_rate"].as_f64().unwrap(), 20.5);
    // 500 * 20.5 * 0.05 + 625
    assert_eq!(body["premium_mxn"].as_f64().unwrap(), 1137.5);

    // Re-entrancy guard: already protected
    let response = router
        .clone()
        .oneshot(post("/gex/warranties/self", attach))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The attachment is queryable
    let response = router
        .clone()
        .oneshot(get(&format!("/gex/warranties/{package_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["declared_value_usd"].as_f64().unwrap(), 500.0);
}

#[tokio::test]
async fn test_attached_policy_keeps_signed_quote_rate() {
    let source = Arc::new(AdjustableRateSource::new(20.5));
    let router = app(state_with_rates(source.clone(), Duration::ZERO));
    let package_id = intake_package(&router, "u1", "CSL011").await;

    // The customer quotes and signs at 20.5
    let response = router
        .clone()
        .oneshot(post("/gex/quote", json!({ "invoice_value_usd": 500.0 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let signed_quote = json_body(response).await;
    assert_eq!(signed_quote["total_cost_mxn"].as_f64().unwrap(), 1137.5);

    // The live rate moves before the submission lands
    source.set(25.0);

    let response = router
        .clone()
        .oneshot(post(
            "/gex/warranties/self",
            json!({
                "package_id": package_id,
                "invoice_value_usd": 500.0,
                "payment_option": "pay_now",
                "signature": "data:image/png;base64,AA==",
                "accepted_at": "2026-08-01T12:00:00Z",
                "quote": signed_quote,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;

    // The policy records the terms the customer signed, not the live rate
    assert_eq!(body["exchange_rate"].as_f64().unwrap(), 20.5);
    assert_eq!(body["premium_mxn"].as_f64().unwrap(), 1137.5);

    let response = router
        .clone()
        .oneshot(get(&format!("/gex/warranties/{package_id}")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["premium_mxn"].as_f64().unwrap(), 1137.5);
}

#[tokio::test]
async fn test_tampered_quote_is_rejected() {
    let router = app(test_state());
    let package_id = intake_package(&router, "u1", "CSL012").await;

    // A premium that doesn't follow from the claimed rate and the fee
    // schedule never attaches
    let response = router
        .clone()
        .oneshot(post(
            "/gex/warranties/self",
            json!({
                "package_id": package_id,
                "invoice_value_usd": 500.0,
                "payment_option": "pay_now",
                "signature": "data:image/png;base64,AA==",
                "accepted_at": "2026-08-01T12:00:00Z",
                "quote": {
                    "insured_value_mxn": 10250.0,
                    "variable_fee_mxn": 512.5,
                    "fixed_fee_mxn": 625.0,
                    "total_cost_mxn": 700.0,
                    "exchange_rate": 20.5,
                },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // As does a non-positive exchange rate
    let response = router
        .clone()
        .oneshot(post(
            "/gex/warranties/self",
            json!({
                "package_id": package_id,
                "invoice_value_usd": 500.0,
                "payment_option": "pay_now",
                "signature": "data:image/png;base64,AA==",
                "accepted_at": "2026-08-01T12:00:00Z",
                "quote": {
                    "insured_value_mxn": 10250.0,
                    "variable_fee_mxn": 512.5,
                    "fixed_fee_mxn": 625.0,
                    "total_cost_mxn": 1137.5,
                    "exchange_rate": -1.0,
                },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_capture_flow() {
    let router = app(test_state());
    let package_id = intake_package(&router, "u1", "CSL020").await;

    let response = router
        .clone()
        .oneshot(post(
            "/consolidations",
            json!({ "user_id": "u1", "package_ids": [package_id] }),
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    let consolidation_id = body["consolidation_id"].as_str().unwrap().to_string();

    // Capture before shipping is a conflict
    let capture = json!({
        "paypal_order_id": "order-9",
        "consolidation_id": consolidation_id,
    });
    let response = router
        .clone()
        .oneshot(post("/payments/capture", capture.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    ship_consolidation(&router, &consolidation_id).await;

    // First capture succeeds
    let response = router
        .clone()
        .oneshot(post("/payments/capture", capture.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = json_body(response).await;
    assert_eq!(first["success"], true);

    // Retrying the same order id is a no-op success with the same
    // transaction
    let response = router
        .clone()
        .oneshot(post("/payments/capture", capture))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = json_body(response).await;
    assert_eq!(first["transaction_id"], second["transaction_id"]);
    assert_eq!(first["captured_at"], second["captured_at"]);

    // Gateway failure surfaces without mutating state
    let response = router
        .clone()
        .oneshot(post(
            "/payments/capture",
            json!({
                "paypal_order_id": "fail-3",
                "consolidation_id": consolidation_id,
            }),
        ))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::OK);

    // Payment alone does not advance the lifecycle
    let response = router
        .clone()
        .oneshot(get(&format!("/consolidations/{consolidation_id}")))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["status"], "SHIPPED");
    assert_eq!(body["paid"], true);
}
