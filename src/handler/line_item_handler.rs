use axum::{
    extract::{Extension, Path, State},
    response::IntoResponse,
    Json,
};
use bson::oid::ObjectId;
use std::sync::Arc;
use validator::Validate;

use crate::dto::quote_dto::{
    AssignMaterialRequest, SetCustomerPriceRequest, SetCuttingPriceRequest,
};
use crate::model::actor::Actor;
use crate::service::pricing_service::{PricingService, PricingServiceImpl};
use crate::util::error::HandlerError;

fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(raw).map_err(|_| HandlerError::bad_request(format!("Invalid {} id", what)))
}

pub async fn assign_material_handler(
    State(service): State<Arc<PricingServiceImpl>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<AssignMaterialRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "line item")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let material_id = parse_object_id(&payload.material_id, "material")?;
    let updated = service.assign_material(&actor, id, material_id).await?;
    Ok(Json(updated))
}

pub async fn set_cutting_price_handler(
    State(service): State<Arc<PricingServiceImpl>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<SetCuttingPriceRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "line item")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let updated = service
        .set_cutting_price(&actor, id, payload.amount, payload.production_time_hours)
        .await?;
    Ok(Json(updated))
}

pub async fn set_customer_price_handler(
    State(service): State<Arc<PricingServiceImpl>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<SetCustomerPriceRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "line item")?;
    payload
        .validate()
        .map_err(|e| HandlerError::bad_request(format!("Validation error: {}", e)))?;
    let updated = service
        .set_customer_price(&actor, id, payload.amount)
        .await?;
    Ok(Json(updated))
}
