//! End-to-end behaviour of the `/api/tasks` and `/api/user/{id}/tasks` routes.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use rstest::rstest;
use serde_json::json;

use backend::config::AccessPolicy;
use common::TestApp;

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn create_echoes_input_and_defaults_finished() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/tasks",
            Some(&ana.token),
            Some(json!({
                "title": "Pay rent",
                "description": "Before the 5th",
                "due_date": "2026-11-05"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Task created successfully");
    let task = &body["data"];
    assert_eq!(task["title"], "Pay rent");
    assert_eq!(task["description"], "Before the 5th");
    assert_eq!(task["due_date"], "2026-11-05");
    assert_eq!(task["finished"], false);
    assert_eq!(task["owner"], ana.user_id.as_str());
}

#[rstest]
#[case::empty(json!({}))]
#[case::missing_description(json!({ "title": "only a title" }))]
#[case::blank_title(json!({ "title": "  ", "description": "d" }))]
#[tokio::test]
async fn create_with_missing_fields_is_rejected(#[case] payload: serde_json::Value) {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;

    let (status, body) = app
        .request(Method::POST, "/api/tasks", Some(&ana.token), Some(payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("required"));

    let (_, listing) = app.get("/api/tasks", Some(&ana.token)).await;
    assert_eq!(listing["meta"]["total"], 0);
}

#[tokio::test]
async fn create_requires_a_token() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/tasks",
            None,
            Some(json!({ "title": "t", "description": "d" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tasks")
        .header(header::AUTHORIZATION, format!("Bearer {}", ana.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
}

// =============================================================================
// Show / update / delete
// =============================================================================

#[rstest]
#[case::unknown_uuid("/api/tasks/6f1c1f3e-8f4a-4a43-9d0e-6a3c8f1d2b7a")]
#[case::not_a_uuid("/api/tasks/42")]
#[tokio::test]
async fn show_missing_task_is_404(#[case] uri: &str) {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;

    let (status, body) = app.get(uri, Some(&ana.token)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn finishing_a_task_is_visible_on_fetch() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    let task = app.create_task(&ana.token, "Water plants").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = app
        .request(
            Method::PUT,
            &uri,
            Some(&ana.token),
            Some(json!({ "finished": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task updated successfully");
    assert_eq!(body["data"]["finished"], true);
    assert_eq!(body["data"]["title"], "Water plants");

    let (status, body) = app.get(&uri, Some(&ana.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["finished"], true);
}

#[tokio::test]
async fn update_rejects_blank_title() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    let task = app.create_task(&ana.token, "Original").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, _) = app
        .request(Method::PUT, &uri, Some(&ana.token), Some(json!({ "title": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get(&uri, Some(&ana.token)).await;
    assert_eq!(body["data"]["title"], "Original");
}

#[tokio::test]
async fn update_unknown_task_is_404() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/tasks/6f1c1f3e-8f4a-4a43-9d0e-6a3c8f1d2b7a",
            Some(&ana.token),
            Some(json!({ "finished": true })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_the_task() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    let task = app.create_task(&ana.token, "Throwaway").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = app
        .request(Method::DELETE, &uri, Some(&ana.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, _) = app.get(&uri, Some(&ana.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request(Method::DELETE, &uri, Some(&ana.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Task not found");
}

// =============================================================================
// Owner scoping
// =============================================================================

#[tokio::test]
async fn user_listing_refuses_other_users() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    let bo = app.account("bo@example.com").await;
    app.create_task(&ana.token, "Ana's task").await;

    let uri = format!("/api/user/{}/tasks", ana.user_id);
    let (status, body) = app.get(&uri, Some(&bo.token)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn user_listing_returns_own_tasks() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    let bo = app.account("bo@example.com").await;
    app.create_task(&ana.token, "first").await;
    app.create_task(&ana.token, "second").await;
    app.create_task(&bo.token, "not ana's").await;

    let uri = format!("/api/user/{}/tasks", ana.user_id);
    let (status, body) = app.get(&uri, Some(&ana.token)).await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["first", "second"]);
}

#[tokio::test]
async fn user_listing_without_token_is_401() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;

    let uri = format!("/api/user/{}/tasks", ana.user_id);
    let (status, _) = app.get(&uri, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owner_policy_hides_foreign_tasks() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    let bo = app.account("bo@example.com").await;
    let task = app.create_task(&ana.token, "Private").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, _) = app.get(&uri, Some(&bo.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::PUT, &uri, Some(&bo.token), Some(json!({ "finished": true })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&bo.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listing) = app.get("/api/tasks", Some(&bo.token)).await;
    assert_eq!(listing["meta"]["total"], 0);

    let (_, body) = app.get(&uri, Some(&ana.token)).await;
    assert_eq!(body["data"]["finished"], false);
}

#[tokio::test]
async fn owner_policy_requires_token_on_show() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    let task = app.create_task(&ana.token, "t").await;

    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());
    let (status, _) = app.get(&uri, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn open_policy_serves_tasks_without_token() {
    let app = TestApp::with_policy(AccessPolicy::Open);
    let ana = app.account("ana@example.com").await;
    let bo = app.account("bo@example.com").await;
    let task = app.create_task(&ana.token, "Shared board").await;
    app.create_task(&bo.token, "Bo's").await;

    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());
    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Shared board");

    let (status, listing) = app.get("/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["meta"]["total"], 2);
}

#[tokio::test]
async fn open_policy_updates_and_deletes_without_token() {
    let app = TestApp::with_policy(AccessPolicy::Open);
    let ana = app.account("ana@example.com").await;
    let task = app.create_task(&ana.token, "Shared board").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = app
        .request(Method::PUT, &uri, None, Some(json!({ "finished": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["finished"], true);
    assert_eq!(body["data"]["owner"], ana.user_id.as_str());

    let (status, body) = app.request(Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Global listing
// =============================================================================

#[rstest]
#[case::first_page("/api/tasks?page=1&per_page=2", 2, 1, 2)]
#[case::last_page("/api/tasks?page=2&per_page=2", 1, 2, 2)]
#[case::past_the_end("/api/tasks?page=9&per_page=2", 0, 9, 2)]
#[case::defaults("/api/tasks", 3, 1, 50)]
#[case::clamped("/api/tasks?per_page=500", 3, 1, 100)]
#[tokio::test]
async fn index_paginates(
    #[case] uri: &str,
    #[case] returned: usize,
    #[case] page: u64,
    #[case] per_page: u64,
) {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;
    for title in ["a", "b", "c"] {
        app.create_task(&ana.token, title).await;
    }

    let (status, body) = app.get(uri, Some(&ana.token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), returned);
    assert_eq!(body["meta"]["page"], page);
    assert_eq!(body["meta"]["per_page"], per_page);
    assert_eq!(body["meta"]["total"], 3);
}

#[tokio::test]
async fn index_rejects_unparseable_query() {
    let app = TestApp::new();
    let ana = app.account("ana@example.com").await;

    let (status, body) = app.get("/api/tasks?page=first", Some(&ana.token)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
