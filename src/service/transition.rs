use crate::model::actor::Role;
use crate::model::quote::QuoteStatus;
use crate::util::error::ServiceError;

/// Role-gated status transition validator.
///
/// The table check and the role check fail with distinct kinds: a request
/// the table cannot reach is a StateConflict, a table-valid request the
/// role may not make is an Authorization failure.
pub fn validate_transition(
    current: QuoteStatus,
    requested: QuoteStatus,
    role: Role,
) -> Result<(), ServiceError> {
    if !current.can_transition_to(requested) {
        return Err(ServiceError::StateConflict(format!(
            "Cannot move quote from '{}' to '{}'",
            current, requested
        )));
    }
    if !role_may_request(role, requested) {
        return Err(ServiceError::Authorization(format!(
            "Role '{}' may not move a quote to '{}'",
            role, requested
        )));
    }
    Ok(())
}

/// Which target statuses each role may request. Customers never drive the
/// table directly; their accept/decline responses are mapped internally
/// under the system role. Matching on the closed enums keeps this matrix
/// exhaustively checkable.
pub fn role_may_request(role: Role, requested: QuoteStatus) -> bool {
    match role {
        Role::Customer => false,
        Role::Operator => matches!(
            requested,
            QuoteStatus::NeedsAttention | QuoteStatus::ReadyForPricing
        ),
        Role::Admin | Role::System => true,
    }
}
