use axum::{body::Body, http::Request, http::StatusCode, middleware::Next, response::Response};
use bson::oid::ObjectId;
use std::str::FromStr;

use crate::model::actor::{Actor, Role};

/// Resolves the acting user from the trusted identity headers the upstream
/// gateway sets after authenticating. The engine does not authenticate;
/// it only refuses requests the gateway left unattributed.
pub async fn actor_middleware(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| ObjectId::parse_str(v).ok());
    let role = req
        .headers()
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Role::from_str(v).ok());

    let (Some(user_id), Some(role)) = (user_id, role) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    req.extensions_mut().insert(Actor::new(user_id, role));
    Ok(next.run(req).await)
}

/// Staff-only routes: operators and admins.
pub async fn require_staff(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    match req.extensions().get::<Actor>() {
        Some(actor) if actor.role.is_staff() => Ok(next.run(req).await),
        Some(_) => Err(StatusCode::FORBIDDEN),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Admin-only routes.
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    match req.extensions().get::<Actor>() {
        Some(actor) if actor.role == Role::Admin => Ok(next.run(req).await),
        Some(_) => Err(StatusCode::FORBIDDEN),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}
