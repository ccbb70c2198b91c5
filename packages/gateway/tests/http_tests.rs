mod common;

use std::error::Error;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use relay_core::QueueName;
use serde_json::json;

use common::{PROCESSING, app_with_worker, app_without_worker, send, send_request, settle};

fn person(id: &str) -> serde_json::Value {
    json!({"id": id, "name": "Ada", "surname": "Lovelace", "age": 36})
}

#[tokio::test]
async fn test_async_item_moves_from_processing_to_done() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let (status, body) = send(&test.app, "POST", "/async", Some(person("a1"))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": "a1"}));

    settle().await;
    let (status, body) = send(&test.app, "GET", "/status/a1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");

    tokio::time::sleep(PROCESSING).await;
    let (status, body) = send(&test.app, "GET", "/status/a1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "done");
    let value = body["result"]["value"].as_i64().ok_or("missing value")?;
    assert!((0..=50).contains(&value));
    Ok(())
}

#[tokio::test]
async fn test_sync_waits_for_the_result() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let (status, body) = send(&test.app, "POST", "/sync", Some(person("s1"))).await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["id"], "s1");
    assert!(body["value"].is_i64());
    assert!(body.get("error").is_none());
    Ok(())
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_publishing() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let (status, body) = send(
        &test.app,
        "POST",
        "/sync",
        Some(json!({"id": "v1", "surname": "Lovelace", "age": 36})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "name should not be empty"}));

    let (status, body) = send(
        &test.app,
        "POST",
        "/async",
        Some(json!({"id": "v2", "name": "Ada", "surname": "Lovelace", "age": 151})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "age must not be greater than 150"}));

    let request = Request::builder()
        .method("POST")
        .uri("/sync")
        .header("content-type", "application/json")
        .body(Body::from("not json"))?;
    let (status, body) = send_request(&test.app, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert_eq!(test.broker.published(QueueName::Inputs), 0);
    Ok(())
}

#[tokio::test]
async fn test_status_requires_an_id() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let (status, body) = send(&test.app, "GET", "/status", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": gateway::MISSING_ID}));
    Ok(())
}

#[tokio::test]
async fn test_unknown_id_reports_not_found() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let (status, body) = send(&test.app, "GET", "/status/ghost", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["reason"], "not found");
    Ok(())
}

#[tokio::test]
async fn test_terminate_fails_waiting_sync_request() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let app = test.app.clone();
    let waiting = tokio::spawn(async move {
        send(&app, "POST", "/sync", Some(person("t1")))
            .await
            .map_err(|e| e.to_string())
    });
    settle().await;

    let (status, body) = send(&test.app, "DELETE", "/terminate", None).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({}));

    let (status, body) = waiting.await??;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "terminated");
    assert!(body["value"].is_null());

    let (_, body) = send(&test.app, "GET", "/status/t1", None).await?;
    assert_eq!(body["reason"], "not found");
    Ok(())
}

#[tokio::test]
async fn test_terminate_right_after_async_submit_forgets_item() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let (status, _) = send(&test.app, "POST", "/async", Some(person("a1"))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&test.app, "DELETE", "/terminate", None).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&test.app, "GET", "/status/a1", None).await?;
    assert_eq!(body["status"], "error");
    assert_eq!(body["reason"], "not found");

    tokio::time::sleep(PROCESSING).await;
    let (_, body) = send(&test.app, "GET", "/status/a1", None).await?;
    assert_eq!(body["reason"], "not found");
    Ok(())
}

#[tokio::test]
async fn test_clear_drops_finished_items() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let (status, _) = send(&test.app, "POST", "/sync", Some(person("c1"))).await?;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = send(&test.app, "DELETE", "/clear", None).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({}));
    settle().await;

    let (_, body) = send(&test.app, "GET", "/status/c1", None).await?;
    assert_eq!(body["reason"], "not found");
    Ok(())
}

#[tokio::test]
async fn test_second_sync_for_pending_id_conflicts() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let app = test.app.clone();
    let first = tokio::spawn(async move {
        send(&app, "POST", "/sync", Some(person("d1")))
            .await
            .map_err(|e| e.to_string())
    });
    settle().await;

    let (status, body) = send(&test.app, "POST", "/sync", Some(person("d1"))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("d1")));

    let (status, _) = first.await??;
    assert_eq!(status, StatusCode::ACCEPTED);
    Ok(())
}

#[tokio::test]
async fn test_async_for_pending_sync_id_conflicts() -> Result<(), Box<dyn Error>> {
    let test = app_with_worker().await?;

    let app = test.app.clone();
    let first = tokio::spawn(async move {
        send(&app, "POST", "/sync", Some(person("e1")))
            .await
            .map_err(|e| e.to_string())
    });
    settle().await;

    let (status, body) = send(&test.app, "POST", "/async", Some(person("e1"))).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("e1")));

    let (status, body) = first.await??;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body["value"].is_i64());
    assert_eq!(test.broker.published(QueueName::Inputs), 1);
    Ok(())
}

#[tokio::test]
async fn test_unanswered_request_times_out() -> Result<(), Box<dyn Error>> {
    let test = app_without_worker(Duration::from_millis(100)).await?;

    let (status, body) = send(&test.app, "POST", "/sync", Some(person("x1"))).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().ok_or("missing error")?;
    assert!(error.starts_with("transport error"));

    let (status, body) = send(&test.app, "GET", "/status/x1", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(test.broker.published(QueueName::StatusRequest), 1);
    Ok(())
}
