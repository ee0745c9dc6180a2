pub mod admin;
pub mod auth;
pub mod billing;
pub mod invitations;
pub mod organizations;
pub mod plans;
pub mod projects;
pub mod settings;
pub mod webhooks;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::db::AppState;
use crate::middleware::auth_required;

/// Compose the full HTTP surface.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/plans", get(plans::list_public_plans))
        .route("/settings/public", get(settings::get_public_settings))
        // Authenticated by provider signature, not a bearer token.
        .route("/billing/webhook", post(webhooks::handle_stripe_webhook));

    let authed = Router::new()
        .route("/auth/refresh", post(auth::refresh))
        .route(
            "/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route(
            "/organizations/{id}",
            get(organizations::get_organization)
                .put(organizations::update_organization)
                .delete(organizations::delete_organization),
        )
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/invitations",
            get(invitations::list_invitations).post(invitations::create_invitation),
        )
        .route("/invitations/{id}/accept", post(invitations::accept_invitation))
        .route("/invitations/{id}/decline", post(invitations::decline_invitation))
        .route("/subscriptions", get(billing::list_subscriptions))
        .route("/billing/checkout", post(billing::create_checkout_session))
        .route(
            "/billing/subscription/status",
            get(billing::get_subscription_status),
        )
        .route(
            "/billing/subscription/{id}",
            delete(billing::cancel_subscription),
        )
        .route("/billing/portal", post(billing::create_portal_session))
        // Admin role is checked inside the handlers; the bearer layer
        // only establishes identity.
        .route("/admin/resources", get(admin::list_resources))
        .route("/admin/resources/{resource}", get(admin::get_resource_data))
        .route(
            "/admin/resources/{resource}/{id}",
            get(admin::get_resource_item)
                .put(admin::update_resource_item)
                .delete(admin::delete_resource_item),
        )
        .route("/admin/stats", get(admin::get_stats))
        .route(
            "/admin/settings",
            get(settings::get_all_settings).put(settings::update_settings),
        )
        .route("/admin/plans", post(plans::create_plan))
        .route(
            "/admin/plans/{id}",
            put(plans::update_plan).delete(plans::delete_plan),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_required));

    Router::new()
        .merge(public)
        .merge(authed)
        .with_state(state)
}
