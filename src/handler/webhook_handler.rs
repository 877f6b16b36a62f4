use axum::{extract::State, response::IntoResponse, Json};
use bson::oid::ObjectId;
use std::sync::Arc;
use validator::Validate;

use crate::dto::quote_dto::PaymentWebhookRequest;
use crate::model::quote::PaymentStatus;
use crate::service::quote_service::{QuoteService, QuoteServiceImpl};
use crate::util::error::HandlerError;

/// Payment provider callback. Transport-level verification (signatures,
/// allow-listing) happens upstream; this endpoint translates the payload
/// into the engine's payment handling.
pub async fn payment_webhook_handler(
    State(service): State<Arc<QuoteServiceImpl>>,
    Json(payload): Json<PaymentWebhookRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let quote_id = ObjectId::parse_str(&payload.quote_id)
        .map_err(|_| HandlerError::bad_request("Invalid quote id"))?;
    let status = match payload.status.as_str() {
        "paid" => PaymentStatus::Paid,
        "failed" => PaymentStatus::Failed,
        other => {
            return Err(HandlerError::bad_request(format!(
                "Unknown payment status: {}",
                other
            )))
        }
    };
    let quote = service
        .handle_payment_webhook(quote_id, status, payload.reference)
        .await?;
    Ok(Json(quote))
}
