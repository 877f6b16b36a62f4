mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use kerf_backend::model::actor::Actor;
use kerf_backend::model::quote::QuoteStatus;

use common::{admin, advance, customer, harness, operator, quote_routes, seed_quote, webhook_routes};

fn authed(builder: axum::http::request::Builder, actor: &Actor) -> axum::http::request::Builder {
    builder
        .header("x-user-id", actor.user_id.to_hex())
        .header("x-user-role", actor.role.as_str())
}

fn json_request(
    method: &str,
    uri: &str,
    actor: &Actor,
    body: Value,
) -> Request<Body> {
    authed(Request::builder().method(method).uri(uri), actor)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn requests_without_identity_headers_are_unauthorized() {
    let ctx = harness();
    let app = quote_routes(&ctx);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/quotes/000000000000000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_roles_are_unauthorized() {
    let ctx = harness();
    let app = quote_routes(&ctx);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/quotes/000000000000000000000000")
                .header("x-user-id", bson::oid::ObjectId::new().to_hex())
                .header("x-user-role", "system")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_customer_registers_a_quote_over_http() {
    let ctx = harness();
    let app = quote_routes(&ctx);
    let acting_customer = customer();

    let response = app
        .oneshot(json_request(
            "POST",
            "/quotes",
            &acting_customer,
            json!({
                "items": [
                    { "file_path": "uploads/bracket.dxf", "original_filename": "bracket.dxf", "quantity": 2 }
                ],
                "shipping_address": "12 Mill Road"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["quote"]["status"], "pending");
    assert_eq!(body["quote"]["quote_number"], "Q000001");
    assert_eq!(body["line_items"].as_array().unwrap().len(), 1);
    assert_eq!(body["margin_percent"], Value::Null);
}

#[tokio::test]
async fn malformed_payloads_are_bad_requests() {
    let ctx = harness();
    let app = quote_routes(&ctx);

    // Empty item list fails request validation before the service runs.
    let response = app
        .oneshot(json_request(
            "POST",
            "/quotes",
            &customer(),
            json!({ "items": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn the_quote_list_is_staff_only() {
    let ctx = harness();
    let app = quote_routes(&ctx);

    let response = app
        .clone()
        .oneshot(
            authed(Request::builder().method("GET").uri("/quotes"), &customer())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(
            authed(Request::builder().method("GET").uri("/quotes"), &operator())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn extreme_pagination_parameters_are_served_not_rejected() {
    let ctx = harness();
    let app = quote_routes(&ctx);
    seed_quote(&ctx, &customer(), &[1]).await;

    // page * limit would overflow u32; the skip must be computed wide.
    let response = app
        .oneshot(
            authed(
                Request::builder()
                    .method("GET")
                    .uri("/quotes?page=4294967295&limit=20"),
                &operator(),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let quotes = body_json(response).await;
    assert_eq!(quotes.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn status_updates_map_service_errors_to_statuses() {
    let ctx = harness();
    let app = quote_routes(&ctx);
    let details = seed_quote(&ctx, &customer(), &[1]).await;
    let id = details.quote.id.unwrap().to_hex();

    // Unreachable transition: conflict.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/quotes/{}/status", id),
            &admin(),
            json!({ "status": "sent" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Reachable one: ok, and the body carries the new status.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/quotes/{}/status", id),
            &operator(),
            json!({ "status": "needs_attention" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "needs_attention");

    // Beyond the operator's reach: forbidden.
    advance(&ctx, details.quote.id.unwrap(), &[QuoteStatus::ReadyForPricing]).await;
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/quotes/{}/status", id),
            &operator(),
            json!({ "status": "sent" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Not a status at all.
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/quotes/{}/status", id),
            &admin(),
            json!({ "status": "bogus" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_quotes_are_not_found() {
    let ctx = harness();
    let app = quote_routes(&ctx);

    let response = app
        .clone()
        .oneshot(
            authed(
                Request::builder()
                    .method("GET")
                    .uri("/quotes/000000000000000000000000"),
                &admin(),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            authed(
                Request::builder().method("GET").uri("/quotes/not-an-id"),
                &admin(),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn revision_creation_is_admin_only_over_http() {
    let ctx = harness();
    let app = quote_routes(&ctx);
    let details = seed_quote(&ctx, &customer(), &[1]).await;
    let quote_id = details.quote.id.unwrap();
    advance(
        &ctx,
        quote_id,
        &[
            QuoteStatus::NeedsAttention,
            QuoteStatus::ReadyForPricing,
            QuoteStatus::Sent,
        ],
    )
    .await;
    let uri = format!("/quotes/{}/revisions", quote_id.to_hex());

    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, &operator(), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(json_request("POST", &uri, &admin(), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["revision_number"], 1);
    assert_eq!(body["status"], "ready_for_pricing");
}

#[tokio::test]
async fn the_payment_webhook_needs_no_identity_headers() {
    let ctx = harness();
    let app = webhook_routes(&ctx);
    let details = seed_quote(&ctx, &customer(), &[1]).await;
    let quote_id = details.quote.id.unwrap();
    advance(
        &ctx,
        quote_id,
        &[
            QuoteStatus::NeedsAttention,
            QuoteStatus::ReadyForPricing,
            QuoteStatus::Sent,
        ],
    )
    .await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "quote_id": quote_id.to_hex(),
                        "status": "paid",
                        "reference": "pay_123"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["payment_status"], "paid");

    // Payment statuses outside the provider's vocabulary are rejected.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "quote_id": quote_id.to_hex(),
                        "status": "refunded"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_customer_accepts_over_http() {
    let ctx = harness();
    let app = quote_routes(&ctx);
    let acting_customer = customer();
    let details = seed_quote(&ctx, &acting_customer, &[1]).await;
    let quote_id = details.quote.id.unwrap();
    advance(
        &ctx,
        quote_id,
        &[
            QuoteStatus::NeedsAttention,
            QuoteStatus::ReadyForPricing,
            QuoteStatus::Sent,
        ],
    )
    .await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/quotes/{}/response", quote_id.to_hex()),
            &acting_customer,
            json!({ "response": "accept" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "accepted");
}
