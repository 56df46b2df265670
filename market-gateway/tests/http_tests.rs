//! Route-level tests over the full stack
//!
//! Each test drives the axum router with oneshot requests against a real
//! ledger (temp RocksDB), stock store, and reconciler.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ledger_core::{Config, Ledger};
use market_gateway::{app, AppState, StaticTokenResolver};
use order_engine::stock::seed_record;
use order_engine::{OrderManager, Role, StockStore};
use reconciler::{
    CheckoutEvent, GatewayKeyPair, InProcessGateway, PaymentReconciler, TracingNotifier,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

struct Fixture {
    router: Router,
    resolver: Arc<StaticTokenResolver>,
    manager: Arc<OrderManager>,
    keypair: GatewayKeyPair,
    product_id: Uuid,
    farmer_id: Uuid,
    _temp: tempfile::TempDir,
}

fn fixture(quantity: u32) -> Fixture {
    let temp = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp.path().to_path_buf();
    let ledger = Arc::new(Ledger::open(config).unwrap());

    let stock = Arc::new(StockStore::new());
    let product_id = Uuid::new_v4();
    let farmer_id = Uuid::new_v4();
    stock.insert(seed_record(
        product_id,
        "Maple syrup",
        farmer_id,
        quantity,
        Decimal::new(1850, 2),
    ));

    let manager = Arc::new(OrderManager::new(stock, ledger));
    let keypair = GatewayKeyPair::generate();
    let payment_reconciler = Arc::new(PaymentReconciler::new(
        keypair.verifier(),
        manager.clone(),
        Arc::new(InProcessGateway::new()),
        Arc::new(TracingNotifier),
    ));

    let resolver = Arc::new(StaticTokenResolver::new());
    let state = AppState {
        manager: manager.clone(),
        reconciler: payment_reconciler,
        auth: resolver.clone(),
    };

    Fixture {
        router: app(state),
        resolver,
        manager,
        keypair,
        product_id,
        farmer_id,
        _temp: temp,
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn order_body(fix: &Fixture, quantity: u32) -> serde_json::Value {
    serde_json::json!({
        "items": [{ "product_id": fix.product_id, "quantity": quantity }]
    })
}

#[tokio::test]
async fn test_create_order_requires_auth() {
    let fix = fixture(10);

    let response = fix
        .router
        .clone()
        .oneshot(json_request("POST", "/orders", None, order_body(&fix, 1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_order_happy_path() {
    let fix = fixture(10);
    let token = fix.resolver.issue(Uuid::new_v4(), Role::Buyer);

    let response = fix
        .router
        .clone()
        .oneshot(json_request("POST", "/orders", Some(&token), order_body(&fix, 3)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["order_id"].is_string());
    let chain_hash = body["chain_hash"].as_str().unwrap();
    assert_eq!(chain_hash.len(), 64);
    assert_ne!(chain_hash, "0".repeat(64));

    assert_eq!(fix.manager.stock().quantity(fix.product_id).unwrap(), 7);
}

#[tokio::test]
async fn test_create_order_insufficient_stock() {
    let fix = fixture(2);
    let token = fix.resolver.issue(Uuid::new_v4(), Role::Buyer);

    let response = fix
        .router
        .clone()
        .oneshot(json_request("POST", "/orders", Some(&token), order_body(&fix, 5)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains(&fix.product_id.to_string()));
}

#[tokio::test]
async fn test_farmer_role_cannot_create_order() {
    let fix = fixture(10);
    let token = fix.resolver.issue(Uuid::new_v4(), Role::Farmer);

    let response = fix
        .router
        .clone()
        .oneshot(json_request("POST", "/orders", Some(&token), order_body(&fix, 1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_order_participant_only() {
    let fix = fixture(10);
    let buyer_id = Uuid::new_v4();
    let buyer_token = fix.resolver.issue(buyer_id, Role::Buyer);
    let stranger_token = fix.resolver.issue(Uuid::new_v4(), Role::Buyer);
    let farmer_token = fix.resolver.issue(fix.farmer_id, Role::Farmer);

    let created = fix
        .router
        .clone()
        .oneshot(json_request("POST", "/orders", Some(&buyer_token), order_body(&fix, 1)))
        .await
        .unwrap();
    let order_id = body_json(created).await["order_id"].as_str().unwrap().to_string();

    let uri = format!("/orders/{}", order_id);

    for (token, expected) in [
        (&buyer_token, StatusCode::OK),
        (&farmer_token, StatusCode::OK),
        (&stranger_token, StatusCode::FORBIDDEN),
    ] {
        let response = fix
            .router
            .clone()
            .oneshot(bare_request("GET", &uri, Some(token)))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }

    // Unknown order
    let response = fix
        .router
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/orders/{}", Uuid::new_v4()),
            Some(&buyer_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let fix = fixture(10);
    let buyer_id = Uuid::new_v4();
    let token = fix.resolver.issue(buyer_id, Role::Buyer);

    let created = fix
        .router
        .clone()
        .oneshot(json_request("POST", "/orders", Some(&token), order_body(&fix, 4)))
        .await
        .unwrap();
    let order_id = body_json(created).await["order_id"].as_str().unwrap().to_string();
    assert_eq!(fix.manager.stock().quantity(fix.product_id).unwrap(), 6);

    let uri = format!("/orders/{}/cancel", order_id);

    for _ in 0..2 {
        let response = fix
            .router
            .clone()
            .oneshot(bare_request("POST", &uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(fix.manager.stock().quantity(fix.product_id).unwrap(), 10);
    }
}

#[tokio::test]
async fn test_status_updates_forward_only() {
    let fix = fixture(10);
    let buyer_token = fix.resolver.issue(Uuid::new_v4(), Role::Buyer);
    let farmer_token = fix.resolver.issue(fix.farmer_id, Role::Farmer);

    let created = fix
        .router
        .clone()
        .oneshot(json_request("POST", "/orders", Some(&buyer_token), order_body(&fix, 1)))
        .await
        .unwrap();
    let order_id = body_json(created).await["order_id"].as_str().unwrap().to_string();
    let uri = format!("/orders/{}/status", order_id);

    // Buyer may not advance status
    let response = fix
        .router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&buyer_token),
            serde_json::json!({"status": "processing"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Owning farmer advances
    let response = fix
        .router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&farmer_token),
            serde_json::json!({"status": "shipped"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "shipped");

    // Backward transition conflicts
    let response = fix
        .router
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&farmer_token),
            serde_json::json!({"status": "processing"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_farmer_stats() {
    let fix = fixture(20);
    let buyer_token = fix.resolver.issue(Uuid::new_v4(), Role::Buyer);
    let farmer_token = fix.resolver.issue(fix.farmer_id, Role::Farmer);

    for quantity in [2u32, 3] {
        let response = fix
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/orders",
                Some(&buyer_token),
                order_body(&fix, quantity),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = fix
        .router
        .clone()
        .oneshot(bare_request("GET", "/orders/farmer/stats", Some(&farmer_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["order_count"], 2);
    assert_eq!(body["units_sold"], 5);
    // 5 × 18.50 serialized as a decimal string
    assert_eq!(body["gross_earnings"], "92.50");

    // Buyers may not read farmer stats
    let response = fix
        .router
        .clone()
        .oneshot(bare_request("GET", "/orders/farmer/stats", Some(&buyer_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_my_orders_by_role() {
    let fix = fixture(20);
    let buyer_id = Uuid::new_v4();
    let buyer_token = fix.resolver.issue(buyer_id, Role::Buyer);
    let farmer_token = fix.resolver.issue(fix.farmer_id, Role::Farmer);

    fix.router
        .clone()
        .oneshot(json_request("POST", "/orders", Some(&buyer_token), order_body(&fix, 1)))
        .await
        .unwrap();

    for token in [&buyer_token, &farmer_token] {
        let response = fix
            .router
            .clone()
            .oneshot(bare_request("GET", "/orders/my", Some(token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}

fn webhook_request(fix: &Fixture, event: &CheckoutEvent, forge: bool) -> Request<Body> {
    let payload = serde_json::to_vec(event).unwrap();
    let signature = if forge {
        GatewayKeyPair::generate().sign_hex(&payload)
    } else {
        fix.keypair.sign_hex(&payload)
    };

    Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("content-type", "application/json")
        .header("x-gateway-signature", signature)
        .body(Body::from(payload))
        .unwrap()
}

fn checkout_event(fix: &Fixture, session_id: &str, quantity: u32) -> CheckoutEvent {
    let line_items = fix
        .manager
        .stock()
        .resolve_items(&[(fix.product_id, quantity)])
        .unwrap();
    CheckoutEvent {
        session_id: session_id.to_string(),
        transaction_id: format!("txn_{}", session_id),
        buyer_id: Uuid::new_v4(),
        amount: ledger_core::line_items_total(&line_items),
        line_items,
    }
}

#[tokio::test]
async fn test_webhook_commit_and_duplicate() {
    let fix = fixture(10);
    let event = checkout_event(&fix, "cs_http", 3);

    let first = fix
        .router
        .clone()
        .oneshot(webhook_request(&fix, &event, false))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_json(first).await;
    assert_eq!(first_body["status"], "committed");
    assert_eq!(first_body["chain_hash"].as_str().unwrap().len(), 64);

    let second = fix
        .router
        .clone()
        .oneshot(webhook_request(&fix, &event, false))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = body_json(second).await;
    assert_eq!(second_body["status"], "duplicate");
    assert_eq!(second_body["order_id"], first_body["order_id"]);

    // One stock deduction across both deliveries
    assert_eq!(fix.manager.stock().quantity(fix.product_id).unwrap(), 7);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let fix = fixture(10);
    let event = checkout_event(&fix, "cs_forged", 2);

    let response = fix
        .router
        .clone()
        .oneshot(webhook_request(&fix, &event, true))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No side effects
    assert_eq!(fix.manager.stock().quantity(fix.product_id).unwrap(), 10);
    assert_eq!(fix.manager.order_count(), 0);
}

#[tokio::test]
async fn test_webhook_requires_signature_header() {
    let fix = fixture(10);
    let event = checkout_event(&fix, "cs_naked", 1);

    let request = Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&event).unwrap()))
        .unwrap();

    let response = fix.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_and_verify_session() {
    let fix = fixture(10);
    let token = fix.resolver.issue(Uuid::new_v4(), Role::Buyer);

    let response = fix
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/payments/create-session",
            Some(&token),
            order_body(&fix, 2),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session = body_json(response).await;
    let session_id = session["session_id"].as_str().unwrap();
    assert_eq!(session["amount"], "37.00");

    let response = fix
        .router
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/payments/verify-session/{}", session_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["paid"], false);

    // Unknown session
    let response = fix
        .router
        .clone()
        .oneshot(bare_request(
            "GET",
            "/payments/verify-session/cs_missing",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_chain() {
    let fix = fixture(10);
    let token = fix.resolver.issue(Uuid::new_v4(), Role::Buyer);

    fix.router
        .clone()
        .oneshot(json_request("POST", "/orders", Some(&token), order_body(&fix, 1)))
        .await
        .unwrap();

    let response = fix
        .router
        .clone()
        .oneshot(bare_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["chain_entries"], 1);
    assert_eq!(body["orders"], 1);
}
