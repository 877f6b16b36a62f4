use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// One cuttable part (one uploaded file) within a quote.
///
/// cutting_price is the operator's production cost estimate;
/// customer_price is the admin's sale price and, once set, must never
/// undercut the cutting price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub quote_id: ObjectId,
    pub material_id: Option<ObjectId>,
    pub quantity: u32,
    pub cutting_price: Option<f64>,
    pub customer_price: Option<f64>,
    pub production_time_hours: Option<f64>,
    /// Opaque reference into external file storage.
    pub file_path: String,
    pub original_filename: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
