use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handler::quote_handler::{
    add_comment_handler, create_quote_handler, create_revision_handler,
    customer_response_handler, get_quote_handler, list_comments_handler, list_quotes_handler,
    update_quote_status_handler, QuoteHandlerState,
};
use crate::middlewares::actor_middleware::{actor_middleware, require_admin, require_staff};

pub fn quote_router(state: QuoteHandlerState) -> Router {
    // Any authenticated actor; per-quote access is checked in the service
    let general = Router::new()
        .route("/quotes", post(create_quote_handler))
        .route("/quotes/{id}", get(get_quote_handler))
        .route("/quotes/{id}/response", post(customer_response_handler))
        .route(
            "/quotes/{id}/comments",
            post(add_comment_handler).get(list_comments_handler),
        );

    let staff = Router::new()
        .route("/quotes", get(list_quotes_handler))
        .route("/quotes/{id}/status", put(update_quote_status_handler))
        .route_layer(middleware::from_fn(require_staff));

    let admin = Router::new()
        .route("/quotes/{id}/revisions", post(create_revision_handler))
        .route_layer(middleware::from_fn(require_admin));

    general
        .merge(staff)
        .merge(admin)
        .layer(middleware::from_fn(actor_middleware))
        .with_state(state)
}
