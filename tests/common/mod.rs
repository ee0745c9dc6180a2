//! Test utilities and fixtures for launchpad integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

pub use launchpad::auth::TokenKeys;
pub use launchpad::billing;
pub use launchpad::crypto;
pub use launchpad::db::{init_db, queries, AppState, DbPool};
pub use launchpad::email::EmailService;
pub use launchpad::error::AppError;
pub use launchpad::handlers;
pub use launchpad::models::*;
pub use launchpad::payments::StripeClient;
pub use launchpad::resource;

pub const TEST_PASSWORD: &str = "password123";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Application state over a shared in-memory database
pub fn test_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool: DbPool = Pool::builder()
        .max_size(4)
        .build(manager)
        .expect("Failed to build test pool");
    {
        let conn = pool.get().unwrap();
        init_db(&conn).expect("Failed to initialize schema");
    }

    AppState {
        db: pool,
        tokens: TokenKeys::new("test-secret", 24),
        stripe: Arc::new(StripeClient::new("sk_test".into(), "whsec_test".into())),
        email: Arc::new(EmailService::new(None, "test@example.com".into())),
        admin: Arc::new(
            handlers::admin::default_registry().expect("Failed to build admin registry"),
        ),
        base_url: "http://localhost:8080".to_string(),
    }
}

pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = handlers::router(state.clone());
    (app, state)
}

/// Create a test user with the shared test password
pub fn create_test_user(conn: &Connection, email: &str, role: UserRole) -> User {
    let password_hash = crypto::hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let user = User::new(
        email.to_string(),
        password_hash,
        "Test".to_string(),
        "User".to_string(),
        role,
    );
    resource::insert(conn, &user).expect("Failed to create test user");
    user
}

/// Create a test organization with the creator auto-added as a member
pub fn create_test_org(conn: &mut Connection, name: &str, creator_id: &str) -> Organization {
    let input = CreateOrganization {
        name: name.to_string(),
        slug: None,
        description: None,
    };
    queries::create_organization(conn, &input, creator_id)
        .expect("Failed to create test organization")
}

pub fn create_test_project(conn: &Connection, organization_id: &str, name: &str) -> Project {
    let project = Project::new(
        organization_id.to_string(),
        name.to_string(),
        String::new(),
    );
    resource::insert(conn, &project).expect("Failed to create test project");
    project
}

pub fn create_test_plan(conn: &Connection, name: &str, monthly_price: f64) -> Plan {
    let input = CreatePlan {
        name: name.to_string(),
        display_name: name.to_string(),
        description: String::new(),
        monthly_price,
        yearly_price: monthly_price * 10.0,
        stripe_price_id_monthly: format!("price_{}_monthly", name),
        stripe_price_id_yearly: format!("price_{}_yearly", name),
        max_organizations: -1,
        max_projects: -1,
        max_members: -1,
        has_priority_support: false,
        has_advanced_features: false,
        has_custom_integrations: false,
        sort_order: 0,
    };
    let plan = input.build();
    resource::insert(conn, &plan).expect("Failed to create test plan");
    plan
}

pub fn create_test_subscription(
    conn: &Connection,
    organization_id: &str,
    plan_name: &str,
    provider_id: Option<&str>,
) -> Subscription {
    let mut subscription =
        billing::new_subscription(organization_id, plan_name, BillingPeriod::Monthly);
    subscription.stripe_subscription_id = provider_id.map(String::from);
    subscription.stripe_customer_id = provider_id.map(|_| "cus_test".to_string());
    resource::insert(conn, &subscription).expect("Failed to create test subscription");
    subscription
}

/// Issue a request against the test router and decode the envelope.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response is not JSON")
    };
    (status, value)
}

/// Register a user through the API; returns (token, user id).
pub async fn register_user(app: &Router, email: &str) -> (String, String) {
    let (status, body) = request(
        app,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": TEST_PASSWORD,
            "firstName": "Test",
            "lastName": "User"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

    let token = body["data"]["token"].as_str().unwrap().to_string();
    let user_id = body["data"]["user"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}
