//! End-to-end API tests: the invitation flow across two users, tenant
//! isolation, and project CRUD through the generic engine.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

/// Register user A, create "Acme", invite b@x.com, register B, accept,
/// verify membership, then verify a second accept is rejected.
#[tokio::test]
async fn test_invitation_flow_end_to_end() {
    let (app, _state) = test_app();

    // (1) register user A
    let (token_a, _user_a) = register_user(&app, "a@x.com").await;

    // (2) A creates organization "Acme" -> slug acme
    let (status, body) = request(
        &app,
        "POST",
        "/organizations",
        Some(&token_a),
        Some(json!({ "name": "Acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let org = &body["data"]["organization"];
    assert_eq!(org["slug"], json!("acme"));
    let org_id = org["id"].as_str().unwrap().to_string();

    // (3) A invites b@x.com
    let (status, body) = request(
        &app,
        "POST",
        "/invitations",
        Some(&token_a),
        Some(json!({ "email": "b@x.com", "organizationId": org_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let invitation_id = body["data"]["invitation"]["id"].as_str().unwrap().to_string();

    // (4) register user B
    let (token_b, _user_b) = register_user(&app, "b@x.com").await;

    // B sees the pending invitation
    let (status, body) = request(&app, "GET", "/invitations", Some(&token_b), None).await;
    assert_eq!(status, StatusCode::OK);
    let invitations = body["data"]["invitations"].as_array().unwrap();
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0]["id"], json!(invitation_id));

    // (5) B accepts -> member of Acme, invitation accepted
    let (status, body) = request(
        &app,
        "POST",
        &format!("/invitations/{}/accept", invitation_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = request(&app, "GET", "/organizations", Some(&token_b), None).await;
    assert_eq!(status, StatusCode::OK);
    let orgs = body["data"]["organizations"].as_array().unwrap();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0]["name"], json!("Acme"));

    // (6) accepting again is rejected: no longer pending
    let (status, _) = request(
        &app,
        "POST",
        &format!("/invitations/{}/accept", invitation_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invitation_create_guards() {
    let (app, state) = test_app();
    let (token_a, user_a) = register_user(&app, "a@x.com").await;
    let (token_c, _) = register_user(&app, "c@x.com").await;

    let org = {
        let mut conn = state.db.get().unwrap();
        create_test_org(&mut conn, "Acme", &user_a)
    };

    // Non-members cannot invite.
    let (status, _) = request(
        &app,
        "POST",
        "/invitations",
        Some(&token_c),
        Some(json!({ "email": "d@x.com", "organizationId": org.id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Existing members cannot be invited.
    let (status, _) = request(
        &app,
        "POST",
        "/invitations",
        Some(&token_a),
        Some(json!({ "email": "a@x.com", "organizationId": org.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A second pending invitation for the same email conflicts.
    let (status, _) = request(
        &app,
        "POST",
        "/invitations",
        Some(&token_a),
        Some(json!({ "email": "b@x.com", "organizationId": org.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = request(
        &app,
        "POST",
        "/invitations",
        Some(&token_a),
        Some(json!({ "email": "b@x.com", "organizationId": org.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_accept_checks_email_and_expiry() {
    let (app, state) = test_app();
    let (token_a, user_a) = register_user(&app, "a@x.com").await;
    let (token_c, _) = register_user(&app, "c@x.com").await;

    let org = {
        let mut conn = state.db.get().unwrap();
        create_test_org(&mut conn, "Acme", &user_a)
    };
    let (status, body) = request(
        &app,
        "POST",
        "/invitations",
        Some(&token_a),
        Some(json!({ "email": "b@x.com", "organizationId": org.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let invitation_id = body["data"]["invitation"]["id"].as_str().unwrap().to_string();

    // Wrong addressee.
    let (status, _) = request(
        &app,
        "POST",
        &format!("/invitations/{}/accept", invitation_id),
        Some(&token_c),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Expired invitations cannot be accepted but can be declined.
    let (token_b, _) = register_user(&app, "b@x.com").await;
    {
        let conn = state.db.get().unwrap();
        conn.execute(
            "UPDATE invitations SET expires_at = 1000 WHERE id = ?1",
            rusqlite::params![invitation_id],
        )
        .unwrap();
    }
    let (status, _) = request(
        &app,
        "POST",
        &format!("/invitations/{}/accept", invitation_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = request(
        &app,
        "POST",
        &format!("/invitations/{}/decline", invitation_id),
        Some(&token_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn test_organization_access_is_tenant_scoped() {
    let (app, state) = test_app();
    let (token_a, user_a) = register_user(&app, "a@x.com").await;
    let (token_b, _) = register_user(&app, "b@x.com").await;

    let org = {
        let mut conn = state.db.get().unwrap();
        create_test_org(&mut conn, "Acme", &user_a)
    };

    // Member sees it.
    let (status, _) = request(
        &app,
        "GET",
        &format!("/organizations/{}", org.id),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Non-member gets the uniform no-access response for get, update,
    // and delete alike.
    for (method, body) in [
        ("GET", None),
        ("PUT", Some(json!({ "name": "Hijacked" }))),
        ("DELETE", None),
    ] {
        let (status, _) = request(
            &app,
            method,
            &format!("/organizations/{}", org.id),
            Some(&token_b),
            body,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} must be denied", method);
    }

    // Unauthenticated gets 401.
    let (status, _) = request(&app, "GET", &format!("/organizations/{}", org.id), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_project_crud_through_api() {
    let (app, state) = test_app();
    let (token, user_id) = register_user(&app, "a@x.com").await;
    let org = {
        let mut conn = state.db.get().unwrap();
        create_test_org(&mut conn, "Acme", &user_id)
    };

    // Create defaults to active status.
    let (status, body) = request(
        &app,
        "POST",
        "/projects",
        Some(&token),
        Some(json!({ "name": "Widget", "organizationId": org.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project = &body["data"]["project"];
    assert_eq!(project["status"], json!("active"));
    let project_id = project["id"].as_str().unwrap().to_string();

    // Partial update: empty name is "unchanged", status applies.
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/projects/{}", project_id),
        Some(&token),
        Some(json!({ "name": "", "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let project = &body["data"]["project"];
    assert_eq!(project["name"], json!("Widget"));
    assert_eq!(project["status"], json!("completed"));

    // List is scoped to the caller's organizations.
    let (status, body) = request(&app, "GET", "/projects", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["projects"].as_array().unwrap().len(), 1);

    // Delete, then the project is gone.
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/projects/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(
        &app,
        "GET",
        &format!("/projects/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_creation_requires_org_membership() {
    let (app, state) = test_app();
    let (_, user_a) = register_user(&app, "a@x.com").await;
    let (token_b, _) = register_user(&app, "b@x.com").await;

    let org = {
        let mut conn = state.db.get().unwrap();
        create_test_org(&mut conn, "Acme", &user_a)
    };

    let (status, _) = request(
        &app,
        "POST",
        "/projects",
        Some(&token_b),
        Some(json!({ "name": "Sneaky", "organizationId": org.id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_project_list_filter_checks_membership() {
    let (app, state) = test_app();
    let (token_a, user_a) = register_user(&app, "a@x.com").await;
    let (_, user_b) = register_user(&app, "b@x.com").await;

    let org_b = {
        let mut conn = state.db.get().unwrap();
        let _org_a = create_test_org(&mut conn, "A Org", &user_a);
        create_test_org(&mut conn, "B Org", &user_b)
    };

    let (status, _) = request(
        &app,
        "GET",
        &format!("/projects?organizationId={}", org_b.id),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_public_plan_catalog() {
    let (app, state) = test_app();
    {
        let conn = state.db.get().unwrap();
        create_test_plan(&conn, "pro", 29.0);
    }

    let (status, body) = request(&app, "GET", "/plans", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let plans = body["data"]["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["name"], json!("pro"));
}
