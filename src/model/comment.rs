use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::model::actor::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentVisibility {
    /// Visible to the customer and staff.
    Public,
    /// Staff-only audit trail.
    Internal,
}

/// Append-only communication/audit entry on a quote. Comments are never
/// edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub quote_id: ObjectId,
    pub author_id: ObjectId,
    pub author_role: Role,
    pub content: String,
    pub visibility: CommentVisibility,
    pub created_at: Option<String>,
}
