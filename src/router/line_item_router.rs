use axum::{middleware, routing::put, Router};
use std::sync::Arc;

use crate::handler::line_item_handler::{
    assign_material_handler, set_cutting_price_handler, set_customer_price_handler,
};
use crate::middlewares::actor_middleware::{actor_middleware, require_admin, require_staff};
use crate::service::pricing_service::PricingServiceImpl;

pub fn line_item_router(service: Arc<PricingServiceImpl>) -> Router {
    let staff = Router::new()
        .route("/line-items/{id}/material", put(assign_material_handler))
        .route(
            "/line-items/{id}/cutting-price",
            put(set_cutting_price_handler),
        )
        .route_layer(middleware::from_fn(require_staff));

    let admin = Router::new()
        .route(
            "/line-items/{id}/customer-price",
            put(set_customer_price_handler),
        )
        .route_layer(middleware::from_fn(require_admin));

    staff
        .merge(admin)
        .layer(middleware::from_fn(actor_middleware))
        .with_state(service)
}
