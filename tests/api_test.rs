mod common;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::test_service;
use serde_json::{json, Value};
use stockledger::api;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_app() -> Result<(Router, TempDir)> {
    let (service, temp) = test_service().await?;
    Ok((api::router(service), temp))
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

async fn get(app: &Router, uri: &str) -> Result<(StatusCode, Value)> {
    let request = Request::builder().uri(uri).body(Body::empty())?;
    send(app, request).await
}

async fn post_move(app: &Router, body: Value) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/stock/move")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    send(app, request).await
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = get(&app, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_post_move_records_movement() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = post_move(
        &app,
        json!({"product": "widget", "type": "IN", "quantity": 100}),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "recorded");
    assert_eq!(body["id"], 1);
    Ok(())
}

#[tokio::test]
async fn test_stock_after_movements() -> Result<()> {
    let (app, _temp) = test_app().await?;

    for (kind, quantity) in [("IN", 100), ("SALE", 30), ("REMOVAL", 5)] {
        let (status, _) = post_move(
            &app,
            json!({"product": "widget", "type": kind, "quantity": quantity}),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get(&app, "/stock/widget").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"product": "widget", "stock": 65}));
    Ok(())
}

#[tokio::test]
async fn test_unknown_product_stock_is_zero() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = get(&app, "/stock/widget").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"product": "widget", "stock": 0}));
    Ok(())
}

#[tokio::test]
async fn test_product_path_is_url_decoded() -> Result<()> {
    let (app, _temp) = test_app().await?;

    post_move(
        &app,
        json!({"product": "blue widget", "type": "IN", "quantity": 4}),
    )
    .await?;

    let (_, body) = get(&app, "/stock/blue%20widget").await?;
    assert_eq!(body["product"], "blue widget");
    assert_eq!(body["stock"], 4);
    Ok(())
}

#[tokio::test]
async fn test_unknown_type_is_rejected_without_writing() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = post_move(
        &app,
        json!({"product": "widget", "type": "RETURN", "quantity": 5}),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_request");

    let (_, body) = get(&app, "/stock").await?;
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_negative_quantity_is_rejected() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = post_move(
        &app,
        json!({"product": "widget", "type": "IN", "quantity": -5}),
    )
    .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_request");

    let (_, body) = get(&app, "/stock/widget").await?;
    assert_eq!(body["stock"], 0);
    Ok(())
}

#[tokio::test]
async fn test_large_quantity_is_recorded() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, created) = post_move(
        &app,
        json!({"product": "bulk", "type": "IN", "quantity": 5_000_000_000u64}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "recorded");

    let (status, body) = get(&app, "/stock/bulk").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stock"], 5_000_000_000i64);

    let (_, body) = get(&app, &format!("/movements/{}", created["id"])).await?;
    assert_eq!(body["quantity"], 5_000_000_000u64);
    Ok(())
}

#[tokio::test]
async fn test_quantity_beyond_storage_range_is_rejected() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, body) = post_move(
        &app,
        json!({"product": "bulk", "type": "IN", "quantity": u64::MAX}),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (_, body) = get(&app, "/stock/bulk").await?;
    assert_eq!(body["stock"], 0);
    Ok(())
}

#[tokio::test]
async fn test_stock_overflow_is_a_storage_error() -> Result<()> {
    let (app, _temp) = test_app().await?;

    for _ in 0..2 {
        let (status, _) = post_move(
            &app,
            json!({"product": "bulk", "type": "IN", "quantity": i64::MAX}),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get(&app, "/stock/bulk").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "storage_error");
    Ok(())
}

#[tokio::test]
async fn test_missing_fields_are_rejected() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (status, _) = post_move(&app, json!({"product": "widget", "type": "IN"})).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_rejected() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/stock/move")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = send(&app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    Ok(())
}

#[tokio::test]
async fn test_missing_content_type_is_rejected() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/stock/move")
        .body(Body::from(
            json!({"product": "widget", "type": "IN", "quantity": 1}).to_string(),
        ))?;
    let (status, _) = send(&app, request).await?;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    Ok(())
}

#[tokio::test]
async fn test_list_all_stock() -> Result<()> {
    let (app, _temp) = test_app().await?;

    post_move(&app, json!({"product": "widget", "type": "IN", "quantity": 3})).await?;
    post_move(&app, json!({"product": "gadget", "type": "IN", "quantity": 8})).await?;
    post_move(&app, json!({"product": "gadget", "type": "SALE", "quantity": 2})).await?;

    let (status, body) = get(&app, "/stock").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"product": "gadget", "stock": 6},
            {"product": "widget", "stock": 3},
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_product_history_with_limit() -> Result<()> {
    let (app, _temp) = test_app().await?;

    for (kind, quantity) in [("IN", 100), ("SALE", 30), ("REMOVAL", 5)] {
        post_move(
            &app,
            json!({"product": "widget", "type": kind, "quantity": quantity}),
        )
        .await?;
    }

    let (status, body) = get(&app, "/stock/widget/movements").await?;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["type"], "IN");
    assert_eq!(history[2]["type"], "REMOVAL");
    assert_eq!(history[2]["quantity"], 5);

    let (_, body) = get(&app, "/stock/widget/movements?limit=1").await?;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = get(&app, "/stock/widget/movements?limit=many").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    Ok(())
}

#[tokio::test]
async fn test_product_summary() -> Result<()> {
    let (app, _temp) = test_app().await?;

    for (kind, quantity) in [("IN", 100), ("SALE", 30), ("REMOVAL", 5)] {
        post_move(
            &app,
            json!({"product": "widget", "type": kind, "quantity": quantity}),
        )
        .await?;
    }

    let (status, body) = get(&app, "/stock/widget/summary").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "product": "widget",
            "stock": 65,
            "received": 100,
            "sold": 30,
            "removed": 5,
            "movements": 3,
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_product_named_move_is_queryable() -> Result<()> {
    let (app, _temp) = test_app().await?;

    post_move(&app, json!({"product": "move", "type": "IN", "quantity": 2})).await?;

    let (status, body) = get(&app, "/stock/move").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"product": "move", "stock": 2}));
    Ok(())
}

#[tokio::test]
async fn test_get_movement_by_id() -> Result<()> {
    let (app, _temp) = test_app().await?;

    let (_, created) = post_move(
        &app,
        json!({"product": "widget", "type": "SALE", "quantity": 7}),
    )
    .await?;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = get(&app, &format!("/movements/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["product"], "widget");
    assert_eq!(body["type"], "SALE");
    assert_eq!(body["quantity"], 7);
    assert!(body["timestamp"].is_string());

    let (status, body) = get(&app, "/movements/999").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = get(&app, "/movements/abc").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    Ok(())
}
