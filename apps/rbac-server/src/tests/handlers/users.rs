use axum::http::StatusCode;
use serde_json::json;

use crate::tests::common::*;

#[tokio::test]
async fn create_user_hashes_password_and_hides_it() {
    let app = create_test_app().await;
    let dev = create_group(&app, "dev").await;

    let (status, body) = post(
        &app,
        "/users",
        json!({
            "username": "alice",
            "password": "plain-secret",
            "email": "alice@example.com",
            "groups": [dev],
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body.get("password").is_none());
    assert!(!body.to_string().contains("plain-secret"));
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_active"], true);
    assert_eq!(names(&body["groups"]), vec!["dev"]);
    assert_eq!(body["groups"][0]["id"], dev);
}

#[tokio::test]
async fn stored_credential_is_argon2_and_verifies() {
    use rbac_crypto::{verify_password, Plaintext};
    use rbac_storage::{Store, UserId};
    use rbac_store_sqlite::SqliteStore;
    use std::sync::Arc;

    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = crate::server::RbacServer::new(store.clone()).router();

    let (_, body) = post(&app, "/users", json!({ "username": "bob", "password": "hunter2" })).await;
    let user = store
        .get_user(&UserId(body["id"].as_i64().unwrap()))
        .await
        .unwrap();

    assert_ne!(user.password_hash, "hunter2");
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(verify_password(&Plaintext::new("hunter2"), &user.password_hash).unwrap());

    // A password update replaces the hash; other updates keep it.
    put(&app, &format!("/users/{}", user.id), json!({ "first_name": "Bob" })).await;
    let unchanged = store.get_user(&user.id).await.unwrap();
    assert_eq!(unchanged.password_hash, user.password_hash);

    put(&app, &format!("/users/{}", user.id), json!({ "password": "new-one" })).await;
    let changed = store.get_user(&user.id).await.unwrap();
    assert!(verify_password(&Plaintext::new("new-one"), &changed.password_hash).unwrap());
    assert!(!verify_password(&Plaintext::new("hunter2"), &changed.password_hash).unwrap());
}

#[tokio::test]
async fn update_replaces_groups_exactly() {
    let app = create_test_app().await;
    let g1 = create_group(&app, "g1").await;
    let g2 = create_group(&app, "g2").await;
    let g3 = create_group(&app, "g3").await;

    let (_, user) = post(
        &app,
        "/users",
        json!({ "username": "carol", "password": "pw", "groups": [g3] }),
    )
    .await;
    let uri = format!("/users/{}", user["id"]);

    let (status, body) = put(&app, &uri, json!({ "groups": [g1, g2] })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["groups"]), vec!["g1", "g2"]);

    let (_, fetched) = get(&app, &uri).await;
    assert_eq!(names(&fetched["groups"]), vec!["g1", "g2"]);
}

#[tokio::test]
async fn patch_without_groups_keeps_them_and_empty_list_clears() {
    let app = create_test_app().await;
    let g1 = create_group(&app, "g1").await;
    let (_, user) = post(
        &app,
        "/users",
        json!({ "username": "dave", "password": "pw", "groups": [g1] }),
    )
    .await;
    let uri = format!("/users/{}", user["id"]);

    let (status, body) = patch(&app, &uri, json!({ "email": "dave@example.com" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "dave@example.com");
    assert_eq!(names(&body["groups"]), vec!["g1"]);

    let (_, body) = patch(&app, &uri, json!({ "groups": null })).await;
    assert_eq!(names(&body["groups"]), vec!["g1"]);

    let (_, body) = patch(&app, &uri, json!({ "groups": [] })).await;
    assert!(body["groups"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_group_is_404_and_changes_nothing() {
    let app = create_test_app().await;
    let g1 = create_group(&app, "g1").await;
    let (_, user) = post(
        &app,
        "/users",
        json!({ "username": "erin", "password": "pw", "groups": [g1] }),
    )
    .await;
    let uri = format!("/users/{}", user["id"]);

    let (status, body) = put(
        &app,
        &uri,
        json!({ "last_name": "Changed", "groups": [g1, 999] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "group 999 not found");

    let (_, fetched) = get(&app, &uri).await;
    assert_eq!(fetched["last_name"], "");
    assert_eq!(names(&fetched["groups"]), vec!["g1"]);
}

#[tokio::test]
async fn validation_errors_are_keyed_by_field() {
    let app = create_test_app().await;

    let (status, body) = post(&app, "/users", json!({ "email": "not-an-email" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["username"][0], "This field is required.");
    assert_eq!(body["password"][0], "This field is required.");
    assert_eq!(body["email"][0], "Enter a valid email address.");

    let (status, body) = post(
        &app,
        "/users",
        json!({ "username": "bad name", "password": "pw" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["username"][0].as_str().unwrap().starts_with("Enter a valid username"));
}

#[tokio::test]
async fn duplicate_username_is_field_error() {
    let app = create_test_app().await;
    post(&app, "/users", json!({ "username": "frank", "password": "pw" })).await;

    let (status, body) = post(
        &app,
        "/users",
        json!({ "username": "frank", "password": "pw2" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["username"][0], "A user with that username already exists.");
}

#[tokio::test]
async fn mistyped_json_is_400() {
    let app = create_test_app().await;
    let (status, body) = post(&app, "/users", json!({ "username": 5, "password": "pw" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["non_field_errors"].is_array());
}

#[tokio::test]
async fn list_is_newest_first_and_delete_removes() {
    let app = create_test_app().await;
    let (_, first) = post(&app, "/users", json!({ "username": "u1", "password": "pw" })).await;
    let (_, second) = post(&app, "/users", json!({ "username": "u2", "password": "pw" })).await;

    let (_, list) = get(&app, "/users").await;
    let ids: Vec<_> = list.as_array().unwrap().iter().map(|u| u["id"].clone()).collect();
    assert_eq!(ids, vec![second["id"].clone(), first["id"].clone()]);

    let uri = format!("/users/{}", first["id"]);
    let (status, body) = delete(&app, &uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not found.");
    assert_eq!(delete(&app, &uri).await.0, StatusCode::NOT_FOUND);
}
