use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::handler::material_handler::{
    create_material_handler, deactivate_material_handler, get_material_handler,
    list_materials_handler,
};
use crate::middlewares::actor_middleware::{actor_middleware, require_admin, require_staff};
use crate::service::material_service::MaterialServiceImpl;

pub fn material_router(service: Arc<MaterialServiceImpl>) -> Router {
    let staff = Router::new()
        .route("/materials", get(list_materials_handler))
        .route("/materials/{id}", get(get_material_handler))
        .route_layer(middleware::from_fn(require_staff));

    let admin = Router::new()
        .route("/materials", post(create_material_handler))
        .route("/materials/{id}", delete(deactivate_material_handler))
        .route_layer(middleware::from_fn(require_admin));

    staff
        .merge(admin)
        .layer(middleware::from_fn(actor_middleware))
        .with_state(service)
}
