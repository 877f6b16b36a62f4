use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{error, info, instrument, warn};

use crate::dto::quote_dto::{CreateQuoteRequest, CustomerResponse, QuoteDetailsDto};
use crate::model::actor::{Actor, Role};
use crate::model::comment::{Comment, CommentVisibility};
use crate::model::line_item::LineItem;
use crate::model::quote::{PaymentStatus, Quote, QuoteStatus, QuoteTotals};
use crate::repository::comment_repo::CommentRepository;
use crate::repository::line_item_repo::LineItemRepository;
use crate::repository::quote_repo::QuoteRepository;
use crate::service::pricing_service::margin_percent;
use crate::service::transition::validate_transition;
use crate::util::error::ServiceError;
use crate::util::notification::{templates, NotificationService};
use crate::util::rate_limit::{RateLimitError, RateLimiter};

pub const INTAKE_ACTION: &str = "quote_intake";

#[async_trait]
pub trait QuoteService: Send + Sync {
    /// Intake: registers a new quote with its line items, status pending.
    async fn register_quote(
        &self,
        actor: &Actor,
        request: CreateQuoteRequest,
    ) -> Result<QuoteDetailsDto, ServiceError>;
    async fn get_quote(&self, actor: &Actor, id: ObjectId)
        -> Result<QuoteDetailsDto, ServiceError>;
    async fn list_quotes(&self, page: u32, limit: u32) -> Result<Vec<Quote>, ServiceError>;
    /// Role-gated status transition; claims the quote for a first-time
    /// operator before the status write.
    async fn update_status(
        &self,
        actor: &Actor,
        id: ObjectId,
        requested: QuoteStatus,
    ) -> Result<Quote, ServiceError>;
    /// Customer accept/decline/request_revision on a sent quote. The
    /// accept and decline arms drive the transition table internally.
    async fn customer_response(
        &self,
        actor: &Actor,
        id: ObjectId,
        response: CustomerResponse,
        message: Option<String>,
    ) -> Result<Quote, ServiceError>;
    async fn add_comment(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
        content: String,
        internal: bool,
    ) -> Result<Comment, ServiceError>;
    async fn list_comments(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
    ) -> Result<Vec<Comment>, ServiceError>;
    /// Payment collaborator entry point. A successful payment on a sent
    /// quote drives the accepted transition through the validator under
    /// the system role; it never writes status directly.
    async fn handle_payment_webhook(
        &self,
        quote_id: ObjectId,
        status: PaymentStatus,
        reference: Option<String>,
    ) -> Result<Quote, ServiceError>;
}

pub struct QuoteServiceImpl {
    pub quote_repo: Arc<dyn QuoteRepository>,
    pub line_item_repo: Arc<dyn LineItemRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub notification: Arc<dyn NotificationService>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl QuoteServiceImpl {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        line_item_repo: Arc<dyn LineItemRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        notification: Arc<dyn NotificationService>,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        QuoteServiceImpl {
            quote_repo,
            line_item_repo,
            comment_repo,
            notification,
            rate_limiter,
        }
    }

    /// Fire-and-forget: delivery failures are logged, never propagated,
    /// and never roll back the mutation that triggered them.
    fn notify(&self, template_id: &'static str, quote_id: ObjectId) {
        let notifier = self.notification.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.enqueue(template_id, quote_id, None).await {
                error!(
                    "Failed to enqueue '{}' notification for quote {}: {}",
                    template_id, quote_id, e
                );
            }
        });
    }

    fn notify_for_status(&self, quote: &Quote) {
        let Some(id) = quote.id else { return };
        match quote.status {
            QuoteStatus::Sent => self.notify(templates::QUOTE_SENT, id),
            QuoteStatus::Accepted => self.notify(templates::QUOTE_ACCEPTED, id),
            QuoteStatus::Declined => self.notify(templates::QUOTE_DECLINED, id),
            _ => {}
        }
    }

    fn check_read_access(actor: &Actor, quote: &Quote) -> Result<(), ServiceError> {
        if actor.role == Role::Customer && quote.customer_id != actor.user_id {
            return Err(ServiceError::Authorization(
                "Quote belongs to another customer".to_string(),
            ));
        }
        Ok(())
    }

    fn details(quote: Quote, line_items: Vec<LineItem>) -> QuoteDetailsDto {
        let totals = QuoteTotals {
            total_cutting_price: quote.total_cutting_price,
            total_customer_price: quote.total_customer_price,
            production_time_hours: quote.production_time_hours,
        };
        QuoteDetailsDto {
            quote,
            line_items,
            margin_percent: margin_percent(&totals),
        }
    }

    /// Operator-side of a transition: the first operator to touch an
    /// unassigned quote claims it atomically before the status write, so
    /// the quote is never left unowned mid-transition. Losing the
    /// compare-and-swap means another operator owns it now.
    async fn ensure_operator_ownership(
        &self,
        actor: &Actor,
        quote: &Quote,
    ) -> Result<(), ServiceError> {
        match quote.operator_id {
            Some(op) if op == actor.user_id => Ok(()),
            Some(_) => Err(ServiceError::Authorization(
                "Quote is assigned to another operator".to_string(),
            )),
            None => {
                let quote_id = quote
                    .id
                    .ok_or_else(|| ServiceError::Internal("Quote has no id".to_string()))?;
                let claimed = self.quote_repo.claim(quote_id, actor.user_id).await?;
                if claimed {
                    info!("Operator {} claimed quote {}", actor.user_id, quote_id);
                    return Ok(());
                }
                // Lost the race; check whether it resolved to us anyway.
                let fresh = self.quote_repo.get_by_id(quote_id).await?;
                if fresh.operator_id == Some(actor.user_id) {
                    Ok(())
                } else {
                    warn!("Operator {} lost claim race on quote {}", actor.user_id, quote_id);
                    Err(ServiceError::Authorization(
                        "Quote was claimed by another operator".to_string(),
                    ))
                }
            }
        }
    }
}

#[async_trait]
impl QuoteService for QuoteServiceImpl {
    #[instrument(skip(self, actor, request), fields(role = %actor.role, items = request.items.len()))]
    async fn register_quote(
        &self,
        actor: &Actor,
        request: CreateQuoteRequest,
    ) -> Result<QuoteDetailsDto, ServiceError> {
        let customer_id = match actor.role {
            Role::Customer => actor.user_id,
            Role::Admin => {
                let raw = request.customer_id.as_deref().ok_or_else(|| {
                    ServiceError::Validation(
                        "customer_id is required when registering on behalf of a customer"
                            .to_string(),
                    )
                })?;
                ObjectId::parse_str(raw).map_err(|_| {
                    ServiceError::Validation("Invalid customer_id".to_string())
                })?
            }
            _ => {
                return Err(ServiceError::Authorization(format!(
                    "Role '{}' may not register quotes",
                    actor.role
                )))
            }
        };

        self.rate_limiter
            .check(&customer_id.to_hex(), INTAKE_ACTION)
            .await
            .map_err(|e| match e {
                RateLimitError::LimitExceeded { .. } => ServiceError::RateLimited(e.to_string()),
                RateLimitError::BackendError(msg) => ServiceError::Dependency(msg),
            })?;

        if request.items.is_empty() {
            return Err(ServiceError::Validation(
                "A quote needs at least one line item".to_string(),
            ));
        }
        if request.items.iter().any(|item| item.quantity < 1) {
            return Err(ServiceError::Validation(
                "Line item quantity must be at least 1".to_string(),
            ));
        }

        let quote_number = self.quote_repo.next_quote_number().await?;
        let quote = Quote {
            id: None,
            quote_number,
            revision_number: 0,
            parent_quote_id: None,
            status: QuoteStatus::Pending,
            customer_id,
            operator_id: None,
            total_cutting_price: None,
            total_customer_price: None,
            production_time_hours: None,
            deadline: request.deadline.clone(),
            shipping_address: request.shipping_address.clone(),
            payment_status: PaymentStatus::Unpaid,
            payment_reference: None,
            created_at: None,
            updated_at: None,
            sent_at: None,
            accepted_at: None,
            declined_at: None,
        };
        let quote = self.quote_repo.create(quote).await?;
        let quote_id = quote
            .id
            .ok_or_else(|| ServiceError::Internal("Inserted quote has no id".to_string()))?;

        let items: Vec<LineItem> = request
            .items
            .iter()
            .map(|item| LineItem {
                id: None,
                quote_id,
                material_id: None,
                quantity: item.quantity,
                cutting_price: None,
                customer_price: None,
                production_time_hours: None,
                file_path: item.file_path.clone(),
                original_filename: item.original_filename.clone(),
                created_at: None,
                updated_at: None,
            })
            .collect();
        let items = self.line_item_repo.create_many(items).await?;

        info!("Quote {} registered with {} line items", quote.quote_number, items.len());
        self.notify(templates::QUOTE_RECEIVED, quote_id);
        Ok(Self::details(quote, items))
    }

    #[instrument(skip(self, actor), fields(id = %id, role = %actor.role))]
    async fn get_quote(
        &self,
        actor: &Actor,
        id: ObjectId,
    ) -> Result<QuoteDetailsDto, ServiceError> {
        let quote = self.quote_repo.get_by_id(id).await?;
        Self::check_read_access(actor, &quote)?;
        let items = self.line_item_repo.list_by_quote(id).await?;
        Ok(Self::details(quote, items))
    }

    #[instrument(skip(self), fields(page, limit))]
    async fn list_quotes(&self, page: u32, limit: u32) -> Result<Vec<Quote>, ServiceError> {
        Ok(self.quote_repo.list(page, limit).await?)
    }

    #[instrument(skip(self, actor), fields(id = %id, requested = %requested, role = %actor.role))]
    async fn update_status(
        &self,
        actor: &Actor,
        id: ObjectId,
        requested: QuoteStatus,
    ) -> Result<Quote, ServiceError> {
        let quote = self.quote_repo.get_by_id(id).await?;
        validate_transition(quote.status, requested, actor.role)?;

        if actor.role == Role::Operator {
            self.ensure_operator_ownership(actor, &quote).await?;
        }

        let updated = self.quote_repo.update_status(id, requested).await?;
        info!("Quote {} moved to '{}'", updated.quote_number, updated.status);
        self.notify_for_status(&updated);
        Ok(updated)
    }

    #[instrument(skip(self, actor, message), fields(id = %id, response = ?response))]
    async fn customer_response(
        &self,
        actor: &Actor,
        id: ObjectId,
        response: CustomerResponse,
        message: Option<String>,
    ) -> Result<Quote, ServiceError> {
        if actor.role != Role::Customer {
            return Err(ServiceError::Authorization(
                "Only the customer responds to a quote".to_string(),
            ));
        }
        let quote = self.quote_repo.get_by_id(id).await?;
        if quote.customer_id != actor.user_id {
            return Err(ServiceError::Authorization(
                "Quote belongs to another customer".to_string(),
            ));
        }

        match response {
            CustomerResponse::Accept | CustomerResponse::Decline => {
                let target = if response == CustomerResponse::Accept {
                    QuoteStatus::Accepted
                } else {
                    QuoteStatus::Declined
                };
                // The customer's answer drives the same table, internally,
                // under the system role.
                validate_transition(quote.status, target, Role::System)?;
                let updated = self.quote_repo.update_status(id, target).await?;
                info!("Customer {} quote {}", response_verb(response), updated.quote_number);
                self.notify_for_status(&updated);
                Ok(updated)
            }
            CustomerResponse::RequestRevision => {
                if quote.status != QuoteStatus::Sent {
                    return Err(ServiceError::StateConflict(format!(
                        "Revisions can only be requested on a sent quote, not '{}'",
                        quote.status
                    )));
                }
                let content = message
                    .unwrap_or_else(|| "Customer requested changes to this quote".to_string());
                self.comment_repo
                    .create(Comment {
                        id: None,
                        quote_id: id,
                        author_id: actor.user_id,
                        author_role: Role::Customer,
                        content,
                        visibility: CommentVisibility::Public,
                        created_at: None,
                    })
                    .await?;
                self.notify(templates::REVISION_REQUESTED, id);
                Ok(quote)
            }
        }
    }

    #[instrument(skip(self, actor, content), fields(quote_id = %quote_id, role = %actor.role))]
    async fn add_comment(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
        content: String,
        internal: bool,
    ) -> Result<Comment, ServiceError> {
        let quote = self.quote_repo.get_by_id(quote_id).await?;
        Self::check_read_access(actor, &quote)?;
        // Customers cannot hide comments from themselves.
        let visibility = if internal && actor.role.is_staff() {
            CommentVisibility::Internal
        } else {
            CommentVisibility::Public
        };
        let comment = self
            .comment_repo
            .create(Comment {
                id: None,
                quote_id,
                author_id: actor.user_id,
                author_role: actor.role,
                content,
                visibility,
                created_at: None,
            })
            .await?;
        Ok(comment)
    }

    #[instrument(skip(self, actor), fields(quote_id = %quote_id, role = %actor.role))]
    async fn list_comments(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
    ) -> Result<Vec<Comment>, ServiceError> {
        let quote = self.quote_repo.get_by_id(quote_id).await?;
        Self::check_read_access(actor, &quote)?;
        let comments = self
            .comment_repo
            .list_by_quote(quote_id, actor.role.is_staff())
            .await?;
        Ok(comments)
    }

    #[instrument(skip(self), fields(quote_id = %quote_id, status = ?status))]
    async fn handle_payment_webhook(
        &self,
        quote_id: ObjectId,
        status: PaymentStatus,
        reference: Option<String>,
    ) -> Result<Quote, ServiceError> {
        let quote = self
            .quote_repo
            .update_payment(quote_id, status, reference)
            .await?;

        if status == PaymentStatus::Paid {
            if quote.status == QuoteStatus::Sent {
                validate_transition(quote.status, QuoteStatus::Accepted, Role::System)?;
                let updated = self
                    .quote_repo
                    .update_status(quote_id, QuoteStatus::Accepted)
                    .await?;
                info!(
                    "Payment confirmed, quote {} accepted via webhook",
                    updated.quote_number
                );
                self.notify_for_status(&updated);
                return Ok(updated);
            }
            warn!(
                "Payment received for quote {} in status '{}'; payment recorded, status untouched",
                quote.quote_number, quote.status
            );
        }
        Ok(quote)
    }
}

fn response_verb(response: CustomerResponse) -> &'static str {
    match response {
        CustomerResponse::Accept => "accepted",
        CustomerResponse::Decline => "declined",
        CustomerResponse::RequestRevision => "requested a revision of",
    }
}
