use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::comment::Comment;
use crate::model::line_item::LineItem;
use crate::model::quote::Quote;

// --- Validated DTOs for request validation ---

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLineItemRequest {
    #[validate(length(min = 1, max = 500))]
    pub file_path: String,

    #[validate(length(min = 1, max = 255))]
    pub original_filename: String,

    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuoteRequest {
    /// Required when an admin registers a quote on a customer's behalf;
    /// ignored for customer actors (their own id is used).
    pub customer_id: Option<String>,

    pub deadline: Option<String>,

    #[validate(length(min = 5, max = 500))]
    pub shipping_address: Option<String>,

    #[validate(length(min = 1), nested)]
    pub items: Vec<CreateLineItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateQuoteStatusRequest {
    #[validate(length(min = 2, max = 50))]
    pub status: String,
}

/// What a customer can do with a quote that was sent to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerResponse {
    Accept,
    Decline,
    RequestRevision,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerResponseRequest {
    pub response: CustomerResponse,

    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRevisionRequest {
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignMaterialRequest {
    #[validate(length(equal = 24))] // ObjectId hex string
    pub material_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetCuttingPriceRequest {
    #[validate(range(min = 0.0))]
    pub amount: f64,

    #[validate(range(min = 0.0))]
    pub production_time_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetCustomerPriceRequest {
    #[validate(range(min = 0.0))]
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,

    /// Staff may mark a comment internal; ignored for customers.
    pub internal: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(range(min = 0.1, max = 100.0))]
    pub thickness_mm: f64,

    #[validate(range(min = 0.0))]
    pub price_per_sqm: f64,
}

/// Payload the payment provider posts to the webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentWebhookRequest {
    #[validate(length(equal = 24))]
    pub quote_id: String,

    /// "paid" or "failed"
    #[validate(length(min = 2, max = 20))]
    pub status: String,

    #[validate(length(max = 255))]
    pub reference: Option<String>,
}

// --- Response DTOs ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDetailsDto {
    pub quote: Quote,
    pub line_items: Vec<LineItem>,
    /// Derived, never persisted; None until both totals are meaningful.
    pub margin_percent: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentListDto {
    pub comments: Vec<Comment>,
}
