use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A sheet material offered for cutting. Materials are soft-deleted via
/// is_active so historic line items keep resolving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub thickness_mm: f64,
    pub price_per_sqm: f64,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
