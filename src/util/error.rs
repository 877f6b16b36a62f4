use axum::{http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub enum HandlerErrorKind {
    NotFound,
    Validation,
    Authorization,
    StateConflict,
    TooManyRequests,
    Dependency,
    Internal,
    BadRequest,
}

impl std::fmt::Display for HandlerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandlerErrorKind::NotFound => "NotFound",
            HandlerErrorKind::Validation => "Validation",
            HandlerErrorKind::Authorization => "Authorization",
            HandlerErrorKind::StateConflict => "StateConflict",
            HandlerErrorKind::TooManyRequests => "TooManyRequests",
            HandlerErrorKind::Dependency => "Dependency",
            HandlerErrorKind::Internal => "Internal",
            HandlerErrorKind::BadRequest => "BadRequest",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Serialize)]
pub struct HandlerError {
    pub error: HandlerErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl HandlerError {
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HandlerError {
            error: HandlerErrorKind::BadRequest,
            message: message.into(),
            details: None,
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = match self.error {
            HandlerErrorKind::NotFound => StatusCode::NOT_FOUND,
            HandlerErrorKind::Validation | HandlerErrorKind::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            HandlerErrorKind::Authorization => StatusCode::FORBIDDEN,
            HandlerErrorKind::StateConflict => StatusCode::CONFLICT,
            HandlerErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            HandlerErrorKind::Dependency => StatusCode::BAD_GATEWAY,
            HandlerErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = axum::Json(self);
        (status, body).into_response()
    }
}

/// Engine-level error taxonomy. Every rejection carries a distinguishable
/// kind plus a human-readable reason; there are no silent failures.
///
/// StateConflict covers transitions unreachable from the current status and
/// margin-floor violations; Authorization covers role/ownership refusals of
/// otherwise reachable operations. The two must stay distinct kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Malformed, negative or missing input.
    Validation(String),
    /// The actor's role lacks permission for the transition/mutation.
    Authorization(String),
    /// Quote, line item or material absent.
    NotFound(String),
    /// Transition unreachable from the current status, or margin floor
    /// violated.
    StateConflict(String),
    /// A collaborator (persistence during recompute, fork side effects)
    /// failed; the triggering write is not rolled back.
    Dependency(String),
    /// Too many attempts for (identifier, action) inside the TTL window.
    RateLimited(String),
    Internal(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "Validation: {}", msg),
            ServiceError::Authorization(msg) => write!(f, "Authorization: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::StateConflict(msg) => write!(f, "State Conflict: {}", msg),
            ServiceError::Dependency(msg) => write!(f, "Dependency Failure: {}", msg),
            ServiceError::RateLimited(msg) => write!(f, "Rate Limited: {}", msg),
            ServiceError::Internal(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<crate::repository::repository_error::RepositoryError> for ServiceError {
    fn from(err: crate::repository::repository_error::RepositoryError) -> Self {
        use crate::repository::repository_error::RepositoryError;
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::ValidationError(msg) => ServiceError::Validation(msg),
            RepositoryError::ConflictError(msg) => ServiceError::StateConflict(msg),
            RepositoryError::DatabaseError(msg) => ServiceError::Dependency(msg),
            RepositoryError::ConnectionError(msg) => ServiceError::Dependency(msg),
            RepositoryError::SerializationError(msg) => ServiceError::Internal(msg),
            RepositoryError::Generic(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        let (kind, message) = match &err {
            ServiceError::Validation(m) => (HandlerErrorKind::Validation, m.clone()),
            ServiceError::Authorization(m) => (HandlerErrorKind::Authorization, m.clone()),
            ServiceError::NotFound(m) => (HandlerErrorKind::NotFound, m.clone()),
            ServiceError::StateConflict(m) => (HandlerErrorKind::StateConflict, m.clone()),
            ServiceError::Dependency(m) => (HandlerErrorKind::Dependency, m.clone()),
            ServiceError::RateLimited(m) => (HandlerErrorKind::TooManyRequests, m.clone()),
            ServiceError::Internal(m) => (HandlerErrorKind::Internal, m.clone()),
        };
        HandlerError {
            error: kind,
            message,
            details: None,
        }
    }
}
