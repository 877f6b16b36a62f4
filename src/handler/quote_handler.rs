use axum::{
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
    Json,
};
use bson::oid::ObjectId;
use std::str::FromStr;
use std::sync::Arc;
use validator::Validate;

use crate::dto::quote_dto::{
    AddCommentRequest, CommentListDto, CreateQuoteRequest, CreateRevisionRequest,
    CustomerResponseRequest, UpdateQuoteStatusRequest,
};
use crate::model::actor::Actor;
use crate::model::quote::QuoteStatus;
use crate::service::quote_service::{QuoteService, QuoteServiceImpl};
use crate::service::revision_service::{RevisionService, RevisionServiceImpl};
use crate::util::error::HandlerError;

/// Shared state for the quote routes.
#[derive(Clone)]
pub struct QuoteHandlerState {
    pub quote_service: Arc<QuoteServiceImpl>,
    pub revision_service: Arc<RevisionServiceImpl>,
}

fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(raw).map_err(|_| HandlerError::bad_request(format!("Invalid {} id", what)))
}

pub async fn create_quote_handler(
    State(state): State<QuoteHandlerState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateQuoteRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let created = state.quote_service.register_quote(&actor, payload).await?;
    Ok(Json(created))
}

pub async fn get_quote_handler(
    State(state): State<QuoteHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let details = state.quote_service.get_quote(&actor, id).await?;
    Ok(Json(details))
}

// Staff only (route layer enforces it)
pub async fn list_quotes_handler(
    State(state): State<QuoteHandlerState>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<impl IntoResponse, HandlerError> {
    let page = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let limit = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let quotes = state.quote_service.list_quotes(page, limit).await?;
    Ok(Json(quotes))
}

pub async fn update_quote_status_handler(
    State(state): State<QuoteHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateQuoteStatusRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let requested = QuoteStatus::from_str(&payload.status)
        .map_err(|e| HandlerError::bad_request(e))?;
    let updated = state
        .quote_service
        .update_status(&actor, id, requested)
        .await?;
    Ok(Json(updated))
}

pub async fn customer_response_handler(
    State(state): State<QuoteHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<CustomerResponseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let updated = state
        .quote_service
        .customer_response(&actor, id, payload.response, payload.message)
        .await?;
    Ok(Json(updated))
}

// Admin only (route layer enforces it)
pub async fn create_revision_handler(
    State(state): State<QuoteHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<CreateRevisionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let revision = state
        .revision_service
        .create_revision(&actor, id, payload.note)
        .await?;
    Ok(Json(revision))
}

pub async fn add_comment_handler(
    State(state): State<QuoteHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let comment = state
        .quote_service
        .add_comment(
            &actor,
            id,
            payload.content,
            payload.internal.unwrap_or(false),
        )
        .await?;
    Ok(Json(comment))
}

pub async fn list_comments_handler(
    State(state): State<QuoteHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let comments = state.quote_service.list_comments(&actor, id).await?;
    Ok(Json(CommentListDto { comments }))
}
