use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a quote. The transition table is directed and
/// acyclic; declined, expired and done are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    NeedsAttention,
    ReadyForPricing,
    Sent,
    Accepted,
    Declined,
    Expired,
    Done,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 8] = [
        QuoteStatus::Pending,
        QuoteStatus::NeedsAttention,
        QuoteStatus::ReadyForPricing,
        QuoteStatus::Sent,
        QuoteStatus::Accepted,
        QuoteStatus::Declined,
        QuoteStatus::Expired,
        QuoteStatus::Done,
    ];

    /// Statuses reachable from `self` in one step.
    pub fn allowed_next(&self) -> &'static [QuoteStatus] {
        match self {
            QuoteStatus::Pending => &[QuoteStatus::NeedsAttention],
            QuoteStatus::NeedsAttention => &[QuoteStatus::ReadyForPricing],
            QuoteStatus::ReadyForPricing => &[QuoteStatus::Sent],
            QuoteStatus::Sent => &[
                QuoteStatus::Accepted,
                QuoteStatus::Declined,
                QuoteStatus::Expired,
            ],
            QuoteStatus::Accepted => &[QuoteStatus::Done],
            QuoteStatus::Declined | QuoteStatus::Expired | QuoteStatus::Done => &[],
        }
    }

    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Pending => "pending",
            QuoteStatus::NeedsAttention => "needs_attention",
            QuoteStatus::ReadyForPricing => "ready_for_pricing",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Declined => "declined",
            QuoteStatus::Expired => "expired",
            QuoteStatus::Done => "done",
        }
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QuoteStatus::Pending),
            "needs_attention" => Ok(QuoteStatus::NeedsAttention),
            "ready_for_pricing" => Ok(QuoteStatus::ReadyForPricing),
            "sent" => Ok(QuoteStatus::Sent),
            "accepted" => Ok(QuoteStatus::Accepted),
            "declined" => Ok(QuoteStatus::Declined),
            "expired" => Ok(QuoteStatus::Expired),
            "done" => Ok(QuoteStatus::Done),
            other => Err(format!("Unknown quote status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
}

/// One priced proposal for a cutting job, addressed to one customer.
///
/// Revisions are numbered copies of a root quote: revision_number 0 is the
/// original; anything above 0 carries a "-R<n>" suffix on the quote number
/// and points at the lineage root via parent_quote_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub quote_number: String,
    pub revision_number: u32,
    pub parent_quote_id: Option<ObjectId>,
    pub status: QuoteStatus,
    pub customer_id: ObjectId,
    pub operator_id: Option<ObjectId>,
    pub total_cutting_price: Option<f64>,
    pub total_customer_price: Option<f64>,
    pub production_time_hours: Option<f64>,
    pub deadline: Option<String>,
    pub shipping_address: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub sent_at: Option<String>,
    pub accepted_at: Option<String>,
    pub declined_at: Option<String>,
}

/// Aggregated pricing for one quote. Produced only by the pricing
/// recompute; client-submitted totals are never trusted. None means
/// "not yet priced" and is also what a sum of exactly zero persists as.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub total_cutting_price: Option<f64>,
    pub total_customer_price: Option<f64>,
    pub production_time_hours: Option<f64>,
}

impl Quote {
    /// Base quote number with any "-R<n>" revision suffix stripped.
    pub fn base_number(&self) -> &str {
        match self.quote_number.rfind("-R") {
            Some(idx) if self.revision_number > 0 => &self.quote_number[..idx],
            _ => &self.quote_number,
        }
    }
}
