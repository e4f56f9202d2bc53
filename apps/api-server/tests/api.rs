//! Router-level tests against an in-memory database.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Local, NaiveDate};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use medbill_db::repository::subscription::extended_expiry;
use medbill_db::{Database, DbConfig, DEMO_USER_ID};
use medbill_server::config::AuthMode;
use medbill_server::{app, AppState, ServerConfig};

const SECRET: &str = "test-secret";

struct TestApp {
    router: Router,
    db: Database,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(ServerConfig::default()).await
    }

    async fn with_config(config: ServerConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().ensure_demo_user(today()).await.unwrap();
        let router = app(AppState::new(db.clone(), config));
        TestApp { router, db }
    }

    async fn verified() -> Self {
        let mut config = ServerConfig::default();
        config.auth.mode = AuthMode::Verified;
        config.auth.jwt_secret = Some(SECRET.to_string());
        Self::with_config(config).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn register(&self, email: &str) -> i64 {
        self.db.users().register(email, "secret1", "Other Shop").await.unwrap().id
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn item(code: &str, quantity: i64, price: f64, cost: f64, expiry: Option<NaiveDate>) -> Value {
    json!({
        "item_code": code,
        "item_name": format!("{} name", code),
        "quantity": quantity,
        "item_price": price,
        "cost_price": cost,
        "mrp": price,
        "gst": 0,
        "expiry_date": expiry.map(|d| d.to_string()),
    })
}

fn sign(claims: Value) -> String {
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn far_future() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "database": true}));
}

#[tokio::test]
async fn test_item_lifecycle() {
    let app = TestApp::new().await;

    let (status, body) = app.json(Method::POST, "/api/items", item("PARA", 10, 12.5, 8.0, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["itemName"], "PARA name");
    let id = body["id"].as_i64().unwrap();

    let (status, body) = app.get("/api/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["totalPrice"], json!(125.0));
    assert_eq!(body["items"][0]["item_price"], json!(12.5));
    assert_eq!(body["items"][0]["uom"], "PCS");

    let (status, _) = app
        .json(Method::PUT, &format!("/api/items/{}", id), item("PARA", 4, 12.5, 8.0, None))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/reports/items-history?limit=1").await;
    assert_eq!(body["pagination"], json!({"page": 1, "limit": 1, "total": 2, "pages": 2}));
    assert_eq!(body["data"][0]["action_type"], "Reduced");
    assert_eq!(body["data"][0]["difference"], 6);

    let (_, body) = app.get("/api/items/search?q=par").await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/api/items/{}", id);
    let (status, body) = app.send(Request::delete(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = app.send(Request::delete(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_item_validation_errors() {
    let app = TestApp::new().await;

    let (status, body) = app.json(Method::POST, "/api/items", item("  ", 1, 1.0, 1.0, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    app.json(Method::POST, "/api/items", item("DUP", 1, 1.0, 1.0, None)).await;
    let (status, body) = app.json(Method::POST, "/api/items", item("DUP", 1, 1.0, 1.0, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "item_code 'DUP' already exists");

    let (status, _) = app.json(Method::POST, "/api/items/bulk-delete", json!({"ids": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let yesterday = today() - Duration::days(1);
    let (status, body) = app
        .json(Method::POST, "/api/items", item("HUGE", 10_000_000_000_000, 1.0, 10_000.0, Some(yesterday)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "quantity must be between 0 and 1000000");

    let (status, _) = app
        .json(Method::POST, "/api/items", item("PRICEY", 1, 2_000_000.0, 1.0, None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/dashboard/summary").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_bills() {
    let app = TestApp::new().await;
    let (_, created) = app.json(Method::POST, "/api/items", item("AMOX", 5, 100.0, 60.0, None)).await;
    let item_id = created["id"].as_i64().unwrap();

    let (status, bill) = app
        .json(
            Method::POST,
            "/api/bills",
            json!({
                "customer_name": "Asha",
                "customer_mobile": "9876500000",
                "items": [{"item_id": item_id, "item_name": "AMOX name", "quantity": 2, "unit_price": 100, "gst": 5}]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bill["total"], json!(210.0));
    assert!(bill["bill_number"].as_str().unwrap().starts_with("BL"));

    let (_, list) = app.get("/api/bills?search=asha").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["total_amount"], json!(210.0));

    let (status, detail) = app.get(&format!("/api/bills/{}", bill["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["customer_name"], "Asha");
    assert_eq!(detail["items"][0]["quantity"], 2);

    let (_, items) = app.get("/api/items").await;
    assert_eq!(items["items"][0]["quantity"], 3);

    let (status, _) = app.get("/api/bills/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(Method::POST, "/api/bills", json!({"customer_name": "Asha", "items": []}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_summary_subtracts_expiry_losses() {
    let app = TestApp::new().await;
    let yesterday = today() - Duration::days(1);

    let (_, sold) = app.json(Method::POST, "/api/items", item("SOLD", 10, 100.0, 60.0, None)).await;
    app.json(Method::POST, "/api/items", item("OLD", 20, 80.0, 50.0, Some(yesterday)))
        .await;
    app.json(
        Method::POST,
        "/api/bills",
        json!({
            "customer_name": "Walk-in",
            "items": [{"item_id": sold["id"], "item_name": "SOLD name", "quantity": 10, "unit_price": 100, "gst": 0}]
        }),
    )
    .await;

    let expected = json!({
        "totalRevenue": 1000.0,
        "todayRevenue": 1000.0,
        "totalBills": 1,
        "pendingAmount": 0.0,
        "profitAmount": -600.0,
    });

    let (status, summary) = app.get("/api/dashboard/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary, expected);

    // A second read must not record the loss again
    let (_, summary) = app.get("/api/dashboard/summary").await;
    assert_eq!(summary, expected);

    let (_, losses) = app.get("/api/dashboard/expiry-losses").await;
    assert_eq!(losses.as_array().unwrap().len(), 1);
    assert_eq!(losses[0]["loss_amount"], json!(1000.0));
    assert_eq!(losses[0]["item_name"], "OLD name");

    let (_, top) = app.get("/api/dashboard/top-items").await;
    assert_eq!(top[0], json!({"item_name": "SOLD name", "qty": 10, "total": 1000.0}));

    let (_, graph) = app.get("/api/dashboard/revenue-graph").await;
    assert_eq!(graph, json!([{"date": today().to_string(), "amount": 1000.0}]));
}

#[tokio::test]
async fn test_owner_from_header_and_query() {
    let app = TestApp::new().await;
    let other = app.register("other@shop.com").await;

    let request = Request::post("/api/items")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-user-id", other.to_string())
        .body(Body::from(item("MINE", 1, 1.0, 1.0, None).to_string()))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, default_owner) = app.get("/api/items").await;
    assert_eq!(default_owner["total"], 0);

    let (_, by_query) = app.get(&format!("/api/items?user_id={}", other)).await;
    assert_eq!(by_query["total"], 1);

    let request = Request::get("/api/items")
        .header("x-user-id", DEMO_USER_ID.to_string())
        .body(Body::empty())
        .unwrap();
    let (_, by_header) = app.send(request).await;
    assert_eq!(by_header["total"], 0);
}

#[tokio::test]
async fn test_verified_mode_rejects_bad_tokens() {
    let app = TestApp::verified().await;

    let request = Request::get("/api/items")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let forged = encode(
        &Header::default(),
        &json!({"uid": "u-1", "exp": far_future()}),
        &EncodingKey::from_secret(b"wrong"),
    )
    .unwrap();
    let request = Request::get("/api/items")
        .header(header::AUTHORIZATION, format!("Bearer {}", forged))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verified_token_provisions_its_own_shop() {
    let app = TestApp::verified().await;
    let token = sign(json!({"uid": "firebase-1", "email": "token@shop.com", "name": "Token Shop", "exp": far_future()}));

    let request = Request::post("/api/items")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(item("TOK", 2, 5.0, 3.0, None).to_string()))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED);

    let user = app.db.users().find_by_external_uid("firebase-1").await.unwrap().unwrap();
    assert_eq!(user.email, "token@shop.com");
    assert_eq!(user.shop_name, "Token Shop");
    assert_ne!(user.id, DEMO_USER_ID);

    let (_, demo_items) = app.get("/api/items").await;
    assert_eq!(demo_items["total"], 0);
}

#[tokio::test]
async fn test_register_login_and_recharge() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            json!({"email": "New@Shop.com", "password": "secret1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, _) = app
        .json(Method::POST, "/api/auth/login", json!({"email": "new@shop.com", "password": "nope"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .json(Method::POST, "/api/auth/login", json!({"email": "new@shop.com", "password": "secret1"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["shop_name"], "My Shop");
    assert_eq!(body["user"]["subscriptionActive"], true);

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/subscription/recharge?user_id={}", id),
            json!({"plan_months": 3, "amount": 999}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let expected = extended_expiry(None, today(), 3).unwrap();
    assert_eq!(body, json!({"ok": true, "expiry": expected.to_string()}));

    let (status, _) = app
        .json(Method::POST, "/api/subscription/recharge", json!({"plan_months": 0, "amount": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_details_round_trip() {
    let app = TestApp::new().await;

    let (_, empty) = app.get("/api/customer-details").await;
    assert_eq!(empty["gstin"], "");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/customer-details",
            json!({"name": "Ravi", "organization_name": "Ravi Medicals", "gstin": "27abcde1234f1z5"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Customer saved successfully");

    let (_, saved) = app.get("/api/customer-details").await;
    assert_eq!(saved["organization_name"], "Ravi Medicals");
    assert_eq!(saved["gstin"], "27ABCDE1234F1Z5");
    assert_eq!(saved["address"], "");
}
