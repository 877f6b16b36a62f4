use axum::{routing::post, Router};
use std::sync::Arc;

use crate::handler::webhook_handler::payment_webhook_handler;
use crate::service::quote_service::QuoteServiceImpl;

/// Machine-to-machine callbacks; no actor headers here. The gateway
/// verifies the provider signature before the request reaches us.
pub fn webhook_router(service: Arc<QuoteServiceImpl>) -> Router {
    Router::new()
        .route("/webhooks/payment", post(payment_webhook_handler))
        .with_state(service)
}
