use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launchpad::config::Config;
use launchpad::crypto;
use launchpad::db::{create_pool, init_db, queries, AppState};
use launchpad::email::EmailService;
use launchpad::handlers;
use launchpad::models::{CreatePlan, User, UserRole};
use launchpad::payments::StripeClient;
use launchpad::resource;
use launchpad::auth::TokenKeys;

#[derive(Parser, Debug)]
#[command(name = "launchpad")]
#[command(about = "Multi-tenant SaaS platform backend")]
struct Cli {
    /// Seed the database with a starter plan catalog
    #[arg(long)]
    seed: bool,
}

/// Create the admin user from ADMIN_EMAIL/ADMIN_PASSWORD if it doesn't
/// exist yet.
fn bootstrap_admin(state: &AppState, email: &str, password: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");

    match queries::get_user_by_email(&conn, email) {
        Ok(Some(_)) => {
            tracing::info!("Admin user already exists, skipping bootstrap");
        }
        Ok(None) => {
            let password_hash =
                crypto::hash_password(password).expect("Failed to hash admin password");
            let admin = User::new(
                email.trim().to_lowercase(),
                password_hash,
                "Admin".to_string(),
                String::new(),
                UserRole::Admin,
            );
            resource::insert(&conn, &admin).expect("Failed to create admin user");
            tracing::info!("Bootstrap admin created: {}", email);
        }
        Err(e) => panic!("Failed to look up admin user: {}", e),
    }
}

/// Seed the free/pro/enterprise plan catalog. Skipped when any plan rows
/// already exist.
fn seed_plans(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::list_active_plans(&conn).expect("Failed to list plans");
    if !existing.is_empty() {
        tracing::info!("Plans already seeded, skipping");
        return;
    }

    let free = CreatePlan {
        name: "free".into(),
        display_name: "Free".into(),
        description: "For individuals trying things out".into(),
        monthly_price: 0.0,
        yearly_price: 0.0,
        stripe_price_id_monthly: String::new(),
        stripe_price_id_yearly: String::new(),
        max_organizations: 1,
        max_projects: 3,
        max_members: 3,
        has_priority_support: false,
        has_advanced_features: false,
        has_custom_integrations: false,
        sort_order: 0,
    };
    let pro = CreatePlan {
        name: "pro".into(),
        display_name: "Pro".into(),
        description: "For growing teams".into(),
        monthly_price: 29.0,
        yearly_price: 290.0,
        stripe_price_id_monthly: String::new(),
        stripe_price_id_yearly: String::new(),
        max_organizations: 5,
        max_projects: -1,
        max_members: 25,
        has_priority_support: true,
        has_advanced_features: true,
        has_custom_integrations: false,
        sort_order: 1,
    };
    let enterprise = CreatePlan {
        name: "enterprise".into(),
        display_name: "Enterprise".into(),
        description: "For large organizations".into(),
        monthly_price: 99.0,
        yearly_price: 990.0,
        stripe_price_id_monthly: String::new(),
        stripe_price_id_yearly: String::new(),
        max_organizations: -1,
        max_projects: -1,
        max_members: -1,
        has_priority_support: true,
        has_advanced_features: true,
        has_custom_integrations: true,
        sort_order: 2,
    };

    for input in [free, pro, enterprise] {
        let plan = input.build();
        resource::insert(&conn, &plan).expect("Failed to seed plan");
        tracing::info!("Seeded plan: {}", plan.name);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launchpad=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = pool.get().expect("Failed to get database connection");
        init_db(&conn).expect("Failed to initialize database schema");
    }

    let admin_registry = handlers::admin::default_registry()
        .expect("Failed to build admin resource registry");

    let state = AppState {
        db: pool,
        tokens: TokenKeys::new(&config.jwt_secret, config.jwt_expiry_hours),
        stripe: Arc::new(StripeClient::new(
            config.stripe_secret_key.clone(),
            config.stripe_webhook_secret.clone(),
        )),
        email: Arc::new(EmailService::new(
            config.email_api_key.clone(),
            config.email_from.clone(),
        )),
        admin: Arc::new(admin_registry),
        base_url: config.base_url.clone(),
    };

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        bootstrap_admin(&state, email, password);
    }
    if cli.seed {
        seed_plans(&state);
    }

    let app: Router = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(if config.dev_mode {
            CorsLayer::very_permissive()
        } else {
            CorsLayer::permissive()
        });

    let addr = config.addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
