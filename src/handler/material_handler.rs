use axum::{
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
    Json,
};
use bson::oid::ObjectId;
use std::sync::Arc;
use validator::Validate;

use crate::dto::quote_dto::CreateMaterialRequest;
use crate::model::actor::Actor;
use crate::service::material_service::{MaterialService, MaterialServiceImpl};
use crate::util::error::HandlerError;

pub async fn create_material_handler(
    State(service): State<Arc<MaterialServiceImpl>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let material = service
        .create_material(&actor, payload.name, payload.thickness_mm, payload.price_per_sqm)
        .await?;
    Ok(Json(material))
}

pub async fn list_materials_handler(
    State(service): State<Arc<MaterialServiceImpl>>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Result<impl IntoResponse, HandlerError> {
    let active_only = params
        .get("active_only")
        .and_then(|v| v.parse().ok())
        .unwrap_or(true);
    let materials = service.list_materials(active_only).await?;
    Ok(Json(materials))
}

pub async fn get_material_handler(
    State(service): State<Arc<MaterialServiceImpl>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = ObjectId::parse_str(&id)
        .map_err(|_| HandlerError::bad_request("Invalid material id"))?;
    let material = service.get_material(id).await?;
    Ok(Json(material))
}

pub async fn deactivate_material_handler(
    State(service): State<Arc<MaterialServiceImpl>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = ObjectId::parse_str(&id)
        .map_err(|_| HandlerError::bad_request("Invalid material id"))?;
    let material = service.deactivate_material(&actor, id).await?;
    Ok(Json(material))
}
