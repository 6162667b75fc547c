use axum::http::StatusCode;
use serde_json::json;

use crate::tests::common::*;

fn is_plain_timestamp(value: &serde_json::Value) -> bool {
    value
        .as_str()
        .map(|s| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok())
        .unwrap_or(false)
}

#[tokio::test]
async fn create_project_bootstraps_group() {
    let app = create_test_app().await;
    let (status, project) = post(&app, "/projects", json!({ "name": "Alpha" })).await;

    assert_eq!(status, StatusCode::CREATED, "{project}");
    assert_eq!(project["name"], "Alpha");
    assert!(is_plain_timestamp(&project["create_time"]));
    assert!(is_plain_timestamp(&project["update_time"]));

    let (_, groups) = get(&app, "/groups").await;
    let alpha: Vec<_> = groups
        .as_array()
        .unwrap()
        .iter()
        .filter(|g| g["name"] == "Alpha")
        .collect();
    assert_eq!(alpha.len(), 1);
    assert_eq!(alpha[0]["id"], project["group"]);
    assert!(alpha[0]["permissions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn clashing_group_name_leaves_no_project() {
    let app = create_test_app().await;
    create_group(&app, "Beta").await;

    let (status, body) = post(&app, "/projects", json!({ "name": "Beta" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"][0], "group with this name already exists.");

    let (_, projects) = get(&app, "/projects").await;
    assert!(projects.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rename_carries_to_group() {
    let app = create_test_app().await;
    let (_, project) = post(&app, "/projects", json!({ "name": "Gamma" })).await;
    let uri = format!("/projects/{}", project["id"]);

    let (status, body) = put(&app, &uri, json!({ "name": "Delta" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Delta");
    assert_eq!(body["create_time"], project["create_time"]);

    let (_, group) = get(&app, &format!("/groups/{}", project["group"])).await;
    assert_eq!(group["name"], "Delta");
}

#[tokio::test]
async fn delete_removes_project_and_group() {
    let app = create_test_app().await;
    let (_, project) = post(&app, "/projects", json!({ "name": "Epsilon" })).await;

    let (status, _) = delete(&app, &format!("/projects/{}", project["id"])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(
        get(&app, &format!("/projects/{}", project["id"])).await.0,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        get(&app, &format!("/groups/{}", project["group"])).await.0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn blank_or_long_names_rejected() {
    let app = create_test_app().await;

    let (status, body) = post(&app, "/projects", json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"][0], "This field may not be blank.");

    let (status, body) = post(&app, "/projects", json!({ "name": "x".repeat(129) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["name"][0], "Ensure this field has no more than 128 characters.");
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = create_test_app().await;
    post(&app, "/projects", json!({ "name": "one" })).await;
    post(&app, "/projects", json!({ "name": "two" })).await;

    let (_, list) = get(&app, "/projects").await;
    assert_eq!(list[0]["name"], "two");
    assert_eq!(list[1]["name"], "one");
}
