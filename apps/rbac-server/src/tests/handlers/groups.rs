use axum::http::StatusCode;
use serde_json::json;

use crate::tests::common::*;

#[tokio::test]
async fn qa_group_gets_view_test_case() {
    let app = create_test_app().await;
    let qa = create_group(&app, "QA").await;
    let view = catalog_permission_id(&app, "view_test_case").await;

    let (status, body) = put(
        &app,
        &format!("/groups/{qa}"),
        json!({ "permissions": [view] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, fetched) = get(&app, &format!("/groups/{qa}")).await;
    assert_eq!(fetched["name"], "QA");
    assert_eq!(
        fetched["permissions"],
        json!([{ "id": view, "name": "查看测试用例" }])
    );
}

#[tokio::test]
async fn create_with_permissions_expands_labels() {
    let app = create_test_app().await;
    let create = catalog_permission_id(&app, "create_env_config").await;
    let view = catalog_permission_id(&app, "view_env_config").await;

    let (status, body) = post(
        &app,
        "/groups",
        json!({ "name": "ops", "permissions": [view, create, view] }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let mut labels = names(&body["permissions"]);
    labels.sort();
    let mut expected = vec!["创建环境配置".to_string(), "查看环境配置".to_string()];
    expected.sort();
    assert_eq!(labels, expected);
}

#[tokio::test]
async fn empty_permissions_clear_absent_keeps() {
    let app = create_test_app().await;
    let edit = catalog_permission_id(&app, "edit_test_case").await;
    let (_, group) = post(&app, "/groups", json!({ "name": "devs", "permissions": [edit] })).await;
    let uri = format!("/groups/{}", group["id"]);

    let (_, body) = patch(&app, &uri, json!({ "name": "developers" })).await;
    assert_eq!(body["name"], "developers");
    assert_eq!(body["permissions"].as_array().unwrap().len(), 1);

    let (_, body) = patch(&app, &uri, json!({ "permissions": [] })).await;
    assert!(body["permissions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_permission_is_404_and_keeps_grants() {
    let app = create_test_app().await;
    let edit = catalog_permission_id(&app, "edit_test_case").await;
    let (_, group) = post(
        &app,
        "/groups",
        json!({ "name": "testers", "permissions": [edit] }),
    )
    .await;
    let uri = format!("/groups/{}", group["id"]);

    let (status, body) = put(&app, &uri, json!({ "permissions": [123456] })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "permission 123456 not found");

    let (_, fetched) = get(&app, &uri).await;
    assert_eq!(fetched["permissions"][0]["id"], edit);
}

#[tokio::test]
async fn duplicate_name_is_field_error() {
    let app = create_test_app().await;
    create_group(&app, "QA").await;

    let (status, body) = post(&app, "/groups", json!({ "name": "QA" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"][0], "group with this name already exists.");
}

#[tokio::test]
async fn deleting_group_keeps_its_members() {
    let app = create_test_app().await;
    let g1 = create_group(&app, "g1").await;
    let (_, user) = post(
        &app,
        "/users",
        json!({ "username": "mia", "password": "pw", "groups": [g1] }),
    )
    .await;

    let (status, _) = delete(&app, &format!("/groups/{g1}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, fetched) = get(&app, &format!("/users/{}", user["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert!(fetched["groups"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn project_group_cannot_be_deleted_directly() {
    let app = create_test_app().await;
    let (_, project) = post(&app, "/projects", json!({ "name": "Alpha" })).await;

    let (status, body) = delete(&app, &format!("/groups/{}", project["group"])).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "group is owned by a project");
}

#[tokio::test]
async fn list_includes_permissions() {
    let app = create_test_app().await;
    let view = catalog_permission_id(&app, "view_test_case").await;
    post(&app, "/groups", json!({ "name": "a", "permissions": [view] })).await;
    post(&app, "/groups", json!({ "name": "b" })).await;

    let (status, list) = get(&app, "/groups").await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list[0]["name"], "b");
    assert_eq!(list[1]["name"], "a");
    assert_eq!(names(&list[1]["permissions"]), vec!["查看测试用例"]);
}

#[tokio::test]
async fn project_group_cannot_be_renamed_directly() {
    let app = create_test_app().await;
    let (_, project) = post(&app, "/projects", json!({ "name": "Alpha" })).await;
    let uri = format!("/groups/{}", project["group"]);

    let (status, body) = patch(&app, &uri, json!({ "name": "Zeta" })).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert!(body["detail"].is_string());

    let (_, group) = get(&app, &uri).await;
    assert_eq!(group["name"], "Alpha");

    // Permissions on the bootstrap group stay editable.
    let view = catalog_permission_id(&app, "view_test_case").await;
    let (status, body) = patch(&app, &uri, json!({ "permissions": [view] })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Alpha");
    assert_eq!(body["permissions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_numeric_id_is_json_404() {
    let app = create_test_app().await;
    for uri in ["/users/abc", "/groups/1.5", "/permissions/x", "/projects/-"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body, json!({ "detail": "Not found." }), "{uri}");
    }

    let (status, body) = delete(&app, "/groups/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not found.");
}
