use axum::http::StatusCode;
use rbac_storage::{ControllableAction, CATALOG_CATEGORY};
use serde_json::json;

use crate::tests::common::*;

#[tokio::test]
async fn catalog_is_listed_newest_first() {
    let app = create_test_app().await;
    let (status, list) = get(&app, "/permissions").await;
    assert_eq!(status, StatusCode::OK);

    let list = list.as_array().unwrap();
    assert_eq!(list.len(), ControllableAction::ALL.len());
    assert!(list.iter().all(|p| p["category"] == CATALOG_CATEGORY));

    let ids: Vec<i64> = list.iter().map(|p| p["id"].as_i64().unwrap()).collect();
    let mut sorted = ids.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn create_ignores_client_category() {
    let app = create_test_app().await;
    let (status, body) = post(
        &app,
        "/permissions",
        json!({ "name": "导出报告", "codename": "export_report", "category": "auth.user" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["category"], CATALOG_CATEGORY);

    let (_, list) = get(&app, "/permissions").await;
    assert_eq!(list[0]["codename"], "export_report");
}

#[tokio::test]
async fn duplicate_codename_is_field_error() {
    let app = create_test_app().await;
    let (status, body) = post(
        &app,
        "/permissions",
        json!({ "name": "again", "codename": "view_test_case" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["codename"][0], "permission with this codename already exists.");
}

#[tokio::test]
async fn relabel_then_delete() {
    let app = create_test_app().await;
    let id = catalog_permission_id(&app, "delete_env_config").await;
    let uri = format!("/permissions/{id}");

    let (status, body) = patch(&app, &uri, json!({ "name": "移除环境配置" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "移除环境配置");
    assert_eq!(body["codename"], "delete_env_config");

    assert_eq!(delete(&app, &uri).await.0, StatusCode::NO_CONTENT);
    assert_eq!(get(&app, &uri).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_fields_are_required() {
    let app = create_test_app().await;
    let (status, body) = post(&app, "/permissions", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"][0], "This field is required.");
    assert_eq!(body["codename"][0], "This field is required.");
}
