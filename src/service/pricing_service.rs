use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{error, info, instrument, warn};

use crate::model::actor::{Actor, Role};
use crate::model::line_item::LineItem;
use crate::model::quote::{Quote, QuoteStatus, QuoteTotals};
use crate::repository::line_item_repo::LineItemRepository;
use crate::repository::material_repo::MaterialRepository;
use crate::repository::quote_repo::QuoteRepository;
use crate::util::error::ServiceError;

/// Sums line items into quote totals. Unset prices count as zero; a sum of
/// exactly zero comes out as None ("not yet priced") rather than 0.
pub fn compute_totals(items: &[LineItem]) -> QuoteTotals {
    let mut cutting = 0.0_f64;
    let mut customer = 0.0_f64;
    let mut hours = 0.0_f64;
    for item in items {
        let qty = item.quantity.max(1) as f64;
        cutting += item.cutting_price.unwrap_or(0.0) * qty;
        customer += item.customer_price.unwrap_or(0.0) * qty;
        hours += item.production_time_hours.unwrap_or(0.0) * qty;
    }
    let nonzero = |sum: f64| if sum == 0.0 { None } else { Some(sum) };
    QuoteTotals {
        total_cutting_price: nonzero(cutting),
        total_customer_price: nonzero(customer),
        production_time_hours: nonzero(hours),
    }
}

/// Derived margin in whole percent; never persisted. Undefined while the
/// cutting total is zero or unset.
pub fn margin_percent(totals: &QuoteTotals) -> Option<i64> {
    let cutting = totals.total_cutting_price?;
    if cutting == 0.0 {
        return None;
    }
    let customer = totals.total_customer_price.unwrap_or(0.0);
    Some(((customer - cutting) / cutting * 100.0).round() as i64)
}

/// Line-item mutations and the aggregate recompute they all funnel into.
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Recomputes and persists the quote totals from its line items.
    /// Idempotent; the sole source of truth for quote-level pricing.
    async fn recompute(&self, quote_id: ObjectId) -> Result<QuoteTotals, ServiceError>;
    async fn assign_material(
        &self,
        actor: &Actor,
        line_item_id: ObjectId,
        material_id: ObjectId,
    ) -> Result<LineItem, ServiceError>;
    async fn set_cutting_price(
        &self,
        actor: &Actor,
        line_item_id: ObjectId,
        amount: f64,
        production_time_hours: Option<f64>,
    ) -> Result<LineItem, ServiceError>;
    async fn set_customer_price(
        &self,
        actor: &Actor,
        line_item_id: ObjectId,
        amount: f64,
    ) -> Result<LineItem, ServiceError>;
}

pub struct PricingServiceImpl {
    pub quote_repo: Arc<dyn QuoteRepository>,
    pub line_item_repo: Arc<dyn LineItemRepository>,
    pub material_repo: Arc<dyn MaterialRepository>,
}

impl PricingServiceImpl {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        line_item_repo: Arc<dyn LineItemRepository>,
        material_repo: Arc<dyn MaterialRepository>,
    ) -> Self {
        PricingServiceImpl {
            quote_repo,
            line_item_repo,
            material_repo,
        }
    }

    async fn quote_for_item(&self, item: &LineItem) -> Result<Quote, ServiceError> {
        Ok(self.quote_repo.get_by_id(item.quote_id).await?)
    }

    /// Operators may only touch quotes that are theirs (or not yet
    /// claimed, for triage-stage mutations); admins always pass.
    fn check_staff_access(
        actor: &Actor,
        quote: &Quote,
        require_assignment: bool,
    ) -> Result<(), ServiceError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Operator => match quote.operator_id {
                Some(op) if op == actor.user_id => Ok(()),
                Some(_) => Err(ServiceError::Authorization(
                    "Quote is assigned to another operator".to_string(),
                )),
                None if !require_assignment => Ok(()),
                None => Err(ServiceError::Authorization(
                    "Quote is not assigned to you".to_string(),
                )),
            },
            Role::Customer | Role::System => Err(ServiceError::Authorization(format!(
                "Role '{}' may not modify line items",
                actor.role
            ))),
        }
    }

    /// Best-effort recompute after a successful item write: the write is
    /// never rolled back, a failure here surfaces as Dependency and the
    /// next write catches the totals up.
    async fn recompute_after_write(&self, quote_id: ObjectId) -> Result<(), ServiceError> {
        if let Err(e) = self.recompute(quote_id).await {
            error!(
                "Totals recompute failed for quote {} (line-item write kept): {}",
                quote_id, e
            );
            return Err(ServiceError::Dependency(format!(
                "Line item updated but totals recompute failed: {}",
                e
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PricingService for PricingServiceImpl {
    #[instrument(skip(self), fields(quote_id = %quote_id))]
    async fn recompute(&self, quote_id: ObjectId) -> Result<QuoteTotals, ServiceError> {
        let items = self.line_item_repo.list_by_quote(quote_id).await?;
        let totals = compute_totals(&items);
        self.quote_repo.update_totals(quote_id, totals).await?;
        info!("Quote totals recomputed from {} line items", items.len());
        Ok(totals)
    }

    #[instrument(skip(self, actor), fields(line_item_id = %line_item_id, material_id = %material_id, role = %actor.role))]
    async fn assign_material(
        &self,
        actor: &Actor,
        line_item_id: ObjectId,
        material_id: ObjectId,
    ) -> Result<LineItem, ServiceError> {
        let item = self.line_item_repo.get_by_id(line_item_id).await?;
        let quote = self.quote_for_item(&item).await?;
        Self::check_staff_access(actor, &quote, false)?;

        if !matches!(
            quote.status,
            QuoteStatus::Pending | QuoteStatus::NeedsAttention | QuoteStatus::ReadyForPricing
        ) {
            return Err(ServiceError::StateConflict(format!(
                "Materials cannot be assigned while the quote is '{}'",
                quote.status
            )));
        }

        let material = self.material_repo.get_by_id(material_id).await?;
        if !material.is_active {
            return Err(ServiceError::Validation(format!(
                "Material '{}' is no longer offered",
                material.name
            )));
        }

        let updated = self
            .line_item_repo
            .set_material(line_item_id, material_id)
            .await?;
        self.recompute_after_write(item.quote_id).await?;
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(line_item_id = %line_item_id, amount, role = %actor.role))]
    async fn set_cutting_price(
        &self,
        actor: &Actor,
        line_item_id: ObjectId,
        amount: f64,
        production_time_hours: Option<f64>,
    ) -> Result<LineItem, ServiceError> {
        if amount < 0.0 {
            return Err(ServiceError::Validation(
                "Cutting price must not be negative".to_string(),
            ));
        }
        if production_time_hours.is_some_and(|h| h < 0.0) {
            return Err(ServiceError::Validation(
                "Production time must not be negative".to_string(),
            ));
        }

        let item = self.line_item_repo.get_by_id(line_item_id).await?;
        let quote = self.quote_for_item(&item).await?;
        // Operators must own the quote; admins pass the role check but not
        // the status gate.
        Self::check_staff_access(actor, &quote, true)?;

        if !matches!(
            quote.status,
            QuoteStatus::NeedsAttention | QuoteStatus::ReadyForPricing
        ) {
            return Err(ServiceError::StateConflict(format!(
                "Cutting prices cannot change while the quote is '{}'",
                quote.status
            )));
        }

        let updated = self
            .line_item_repo
            .set_cutting_price(line_item_id, amount, production_time_hours)
            .await?;
        self.recompute_after_write(item.quote_id).await?;
        Ok(updated)
    }

    #[instrument(skip(self, actor), fields(line_item_id = %line_item_id, amount, role = %actor.role))]
    async fn set_customer_price(
        &self,
        actor: &Actor,
        line_item_id: ObjectId,
        amount: f64,
    ) -> Result<LineItem, ServiceError> {
        if actor.role != Role::Admin {
            return Err(ServiceError::Authorization(
                "Only admins set customer prices".to_string(),
            ));
        }
        if amount < 0.0 {
            return Err(ServiceError::Validation(
                "Customer price must not be negative".to_string(),
            ));
        }

        let item = self.line_item_repo.get_by_id(line_item_id).await?;
        let quote = self.quote_for_item(&item).await?;

        if !matches!(
            quote.status,
            QuoteStatus::ReadyForPricing | QuoteStatus::Sent
        ) {
            return Err(ServiceError::StateConflict(format!(
                "Customer prices cannot change while the quote is '{}'",
                quote.status
            )));
        }

        // Margin floor: the sale price never undercuts the cutting cost.
        if let Some(cutting) = item.cutting_price {
            if amount < cutting {
                warn!(
                    "Rejected customer price {} below cutting price {}",
                    amount, cutting
                );
                return Err(ServiceError::StateConflict(format!(
                    "Customer price {:.2} is below the cutting price {:.2}",
                    amount, cutting
                )));
            }
        }

        let updated = self
            .line_item_repo
            .set_customer_price(line_item_id, amount)
            .await?;
        self.recompute_after_write(item.quote_id).await?;
        Ok(updated)
    }
}
