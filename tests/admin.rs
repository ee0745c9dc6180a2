//! Admin registry and façade tests: metadata derivation, capability
//! gating, role enforcement, and registry-driven editing.

mod common;

use axum::http::StatusCode;
use launchpad::registry::{AdminRegistry, Capability};
use serde_json::json;

use common::*;

fn admin_token(state: &AppState) -> (String, User) {
    let conn = state.db.get().unwrap();
    let admin = create_test_user(&conn, "admin@x.com", UserRole::Admin);
    let token = state.tokens.generate(&admin.id).unwrap();
    (token, admin)
}

#[test]
fn test_duplicate_registration_is_an_error() {
    let mut registry = AdminRegistry::new();
    registry
        .register::<Setting>("setting", &[Capability::List])
        .unwrap();
    let err = registry
        .register::<Setting>("setting", &[Capability::List])
        .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)), "got {:?}", err);
}

#[test]
fn test_default_registry_contents() {
    let registry = handlers::admin::default_registry().unwrap();

    for name in [
        "user",
        "organization",
        "project",
        "subscription",
        "invitation",
        "plan",
        "setting",
    ] {
        assert!(registry.get(name).is_some(), "{} must be registered", name);
    }

    // Capability subsets follow what each entity supports.
    assert!(!registry.get("subscription").unwrap().can(Capability::Delete));
    assert!(!registry.get("invitation").unwrap().can(Capability::Edit));
    assert!(registry.get("plan").unwrap().can(Capability::Create));
}

#[test]
fn test_user_metadata_derivation() {
    let registry = handlers::admin::default_registry().unwrap();
    let meta = &registry.get("user").unwrap().meta;

    assert_eq!(meta.plural_name, "users");

    let first_name = meta.fields.iter().find(|f| f.name == "firstName").unwrap();
    assert_eq!(first_name.label, "First Name");
    assert!(first_name.editable);

    // System fields are visible but not editable, and password hashes
    // are not exposed at all.
    let id = meta.fields.iter().find(|f| f.name == "id").unwrap();
    assert!(!id.editable);
    assert!(meta.fields.iter().all(|f| f.name != "passwordHash"));

    // Priority display fields first: email comes before the fill-ups.
    assert_eq!(meta.display_fields[0], "email");
    assert!(meta.display_fields.len() <= 5);

    // Search fields are the editable strings.
    assert!(meta.search_fields.contains(&"email".to_string()));
    assert!(!meta.search_fields.contains(&"isActive".to_string()));
}

#[tokio::test]
async fn test_admin_surface_requires_admin_role() {
    let (app, _state) = test_app();
    let (user_token, _) = register_user(&app, "user@x.com").await;

    for uri in ["/admin/resources", "/admin/stats", "/admin/settings"] {
        let (status, _) = request(&app, "GET", uri, Some(&user_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} must require admin", uri);
    }

    let (status, _) = request(&app, "GET", "/admin/resources", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_lists_resources_and_items() {
    let (app, state) = test_app();
    let (token, _) = admin_token(&state);

    let (status, body) = request(&app, "GET", "/admin/resources", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let resources = body["data"]["resources"].as_object().unwrap();
    assert!(resources.contains_key("organization"));
    assert_eq!(resources["organization"]["pluralName"], json!("organizations"));

    let (status, body) = request(&app, "GET", "/admin/resources/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1, "the admin user itself");
    assert!(items[0].get("passwordHash").is_none());

    let (status, _) = request(&app, "GET", "/admin/resources/nonexistent", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_edit_applies_editable_fields_only() {
    let (app, state) = test_app();
    let (token, _) = admin_token(&state);

    let user = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "target@x.com", UserRole::User)
    };

    let (status, body) = request(
        &app,
        "PUT",
        &format!("/admin/resources/user/{}", user.id),
        Some(&token),
        Some(json!({
            "role": "admin",
            "firstName": "Promoted",
            "id": "hijacked-id",
            "createdAt": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let item = &body["data"]["item"];
    assert_eq!(item["role"], json!("admin"));
    assert_eq!(item["firstName"], json!("Promoted"));
    // System fields are ignored.
    assert_eq!(item["id"], json!(user.id));
    assert_eq!(item["createdAt"], json!(user.created_at));

    // The hidden password hash survived the round-trip edit.
    let (status, _) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "target@x.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login must still work after admin edit");
}

#[tokio::test]
async fn test_admin_edit_rejects_bad_values() {
    let (app, state) = test_app();
    let (token, _) = admin_token(&state);
    let user = {
        let conn = state.db.get().unwrap();
        create_test_user(&conn, "target@x.com", UserRole::User)
    };

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/resources/user/{}", user.id),
        Some(&token),
        Some(json!({ "role": "superuser" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_capability_gating() {
    let (app, state) = test_app();
    let (token, admin) = admin_token(&state);

    let (org, subscription) = {
        let mut conn = state.db.get().unwrap();
        let org = create_test_org(&mut conn, "Acme", &admin.id);
        let subscription = create_test_subscription(&conn, &org.id, "pro", None);
        (org, subscription)
    };

    // Subscriptions don't support admin deletion.
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/admin/resources/subscription/{}", subscription.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Invitations don't support admin editing.
    let invitation = {
        let conn = state.db.get().unwrap();
        let invitation = Invitation::new(org.id.clone(), admin.id.clone(), "b@x.com".into());
        resource::insert(&conn, &invitation).unwrap();
        invitation
    };
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/resources/invitation/{}", invitation.id),
        Some(&token),
        Some(json!({ "email": "evil@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // But invitation deletion works.
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/admin/resources/invitation/{}", invitation.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_stats_counts() {
    let (app, state) = test_app();
    let (token, admin) = admin_token(&state);

    {
        let mut conn = state.db.get().unwrap();
        let org = create_test_org(&mut conn, "Acme", &admin.id);
        let project = create_test_project(&conn, &org.id, "P1");
        create_test_project(&conn, &org.id, "P2");

        // One of the two projects is completed.
        let update = UpdateProject {
            name: None,
            description: None,
            status: Some(ProjectStatus::Completed),
        };
        resource::update::<Project, _>(&conn, &project.id, &update).unwrap();
    }

    let (status, body) = request(&app, "GET", "/admin/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"]["stats"];
    assert_eq!(stats["users"], json!(1));
    assert_eq!(stats["organizations"], json!(1));
    assert_eq!(stats["projects"], json!(2));
    assert_eq!(stats["activeProjects"], json!(1));
}

#[tokio::test]
async fn test_admin_settings_upsert() {
    let (app, state) = test_app();
    let (token, _) = admin_token(&state);

    let (status, _) = request(
        &app,
        "PUT",
        "/admin/settings",
        Some(&token),
        Some(json!({ "site_name": "Launchpad", "support_email": "help@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, "GET", "/admin/settings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["settings"]["site_name"], json!("Launchpad"));

    // Update an existing key in place.
    let (status, _) = request(
        &app,
        "PUT",
        "/admin/settings",
        Some(&token),
        Some(json!({ "site_name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = request(&app, "GET", "/admin/settings", Some(&token), None).await;
    assert_eq!(body["data"]["settings"]["site_name"], json!("Renamed"));

    // New keys default to private: not visible publicly.
    let (status, body) = request(&app, "GET", "/settings/public", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["settings"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_plan_management() {
    let (app, state) = test_app();
    let (token, _) = admin_token(&state);

    let (status, body) = request(
        &app,
        "POST",
        "/admin/plans",
        Some(&token),
        Some(json!({ "name": "pro", "displayName": "Pro", "monthlyPrice": 29.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let plan_id = body["data"]["plan"]["id"].as_str().unwrap().to_string();

    // Duplicate plan names conflict.
    let (status, _) = request(
        &app,
        "POST",
        "/admin/plans",
        Some(&token),
        Some(json!({ "name": "pro", "displayName": "Pro Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Partial update through the typed updater.
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/admin/plans/{}", plan_id),
        Some(&token),
        Some(json!({ "monthlyPrice": 39.0, "displayName": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["plan"]["monthlyPrice"], json!(39.0));
    assert_eq!(body["data"]["plan"]["displayName"], json!("Pro"));

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/admin/plans/{}", plan_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&app, "GET", "/plans", None, None).await;
    assert!(body["data"]["plans"].as_array().unwrap().is_empty());
}
