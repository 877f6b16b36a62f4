use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{error, info, instrument};

use crate::model::actor::{Actor, Role};
use crate::model::comment::{Comment, CommentVisibility};
use crate::model::line_item::LineItem;
use crate::model::quote::{PaymentStatus, Quote, QuoteStatus};
use crate::repository::comment_repo::CommentRepository;
use crate::repository::line_item_repo::LineItemRepository;
use crate::repository::quote_repo::QuoteRepository;
use crate::util::error::ServiceError;
use crate::util::notification::{templates, NotificationService};

#[async_trait]
pub trait RevisionService: Send + Sync {
    /// Forks a sent quote into the next numbered revision of its lineage.
    async fn create_revision(
        &self,
        actor: &Actor,
        original_quote_id: ObjectId,
        note: Option<String>,
    ) -> Result<Quote, ServiceError>;
}

pub struct RevisionServiceImpl {
    pub quote_repo: Arc<dyn QuoteRepository>,
    pub line_item_repo: Arc<dyn LineItemRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub notification: Arc<dyn NotificationService>,
}

impl RevisionServiceImpl {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        line_item_repo: Arc<dyn LineItemRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        notification: Arc<dyn NotificationService>,
    ) -> Self {
        RevisionServiceImpl {
            quote_repo,
            line_item_repo,
            comment_repo,
            notification,
        }
    }

    /// Best-effort audit comment; a failure here never fails the fork.
    async fn append_comment(&self, actor: &Actor, quote_id: ObjectId, content: String) {
        let result = self
            .comment_repo
            .create(Comment {
                id: None,
                quote_id,
                author_id: actor.user_id,
                author_role: actor.role,
                content,
                visibility: CommentVisibility::Internal,
                created_at: None,
            })
            .await;
        if let Err(e) = result {
            error!("Failed to append revision comment on quote {}: {}", quote_id, e);
        }
    }
}

#[async_trait]
impl RevisionService for RevisionServiceImpl {
    #[instrument(skip(self, actor, note), fields(original = %original_quote_id, role = %actor.role))]
    async fn create_revision(
        &self,
        actor: &Actor,
        original_quote_id: ObjectId,
        note: Option<String>,
    ) -> Result<Quote, ServiceError> {
        if actor.role != Role::Admin {
            return Err(ServiceError::Authorization(
                "Only admins create revisions".to_string(),
            ));
        }

        let original = self.quote_repo.get_by_id(original_quote_id).await?;
        if original.status != QuoteStatus::Sent {
            return Err(ServiceError::StateConflict(format!(
                "Only a sent quote can be revised, not '{}'",
                original.status
            )));
        }

        // Fan-out numbering: every revision points at the lineage root,
        // not its immediate predecessor.
        let (revision_number, parent_quote_id) = if original.revision_number == 0 {
            (1, Some(original_quote_id))
        } else {
            (original.revision_number + 1, original.parent_quote_id)
        };
        let quote_number = format!("{}-R{}", original.base_number(), revision_number);

        // The revision skips intake and triage, but the admin must
        // re-price: customer-facing totals are deliberately not copied.
        let revision = Quote {
            id: None,
            quote_number,
            revision_number,
            parent_quote_id,
            status: QuoteStatus::ReadyForPricing,
            customer_id: original.customer_id,
            operator_id: original.operator_id,
            total_cutting_price: original.total_cutting_price,
            total_customer_price: None,
            production_time_hours: original.production_time_hours,
            deadline: original.deadline.clone(),
            shipping_address: original.shipping_address.clone(),
            payment_status: PaymentStatus::Unpaid,
            payment_reference: None,
            created_at: None,
            updated_at: None,
            sent_at: None,
            accepted_at: None,
            declined_at: None,
        };
        let revision = self.quote_repo.create(revision).await?;
        let revision_id = revision
            .id
            .ok_or_else(|| ServiceError::Internal("Inserted revision has no id".to_string()))?;

        let originals = self.line_item_repo.list_by_quote(original_quote_id).await?;
        let clones: Vec<LineItem> = originals
            .iter()
            .map(|item| LineItem {
                id: None,
                quote_id: revision_id,
                material_id: item.material_id,
                quantity: item.quantity,
                cutting_price: item.cutting_price,
                // Cleared even when the original was priced.
                customer_price: None,
                production_time_hours: item.production_time_hours,
                file_path: item.file_path.clone(),
                original_filename: item.original_filename.clone(),
                created_at: None,
                updated_at: None,
            })
            .collect();
        self.line_item_repo.create_many(clones).await.map_err(|e| {
            error!("Revision {} created but line items failed to clone: {}", revision.quote_number, e);
            ServiceError::Dependency(format!(
                "Revision created but line items failed to clone: {}",
                e
            ))
        })?;

        info!(
            "Revision {} forked from {} ({} line items)",
            revision.quote_number,
            original.quote_number,
            originals.len()
        );

        let note_suffix = note
            .as_deref()
            .map(|n| format!(": {}", n))
            .unwrap_or_default();
        self.append_comment(
            actor,
            original_quote_id,
            format!("Superseded by revision {}{}", revision.quote_number, note_suffix),
        )
        .await;
        self.append_comment(
            actor,
            revision_id,
            format!("Created as a revision of {}{}", original.quote_number, note_suffix),
        )
        .await;

        let notifier = self.notification.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier
                .enqueue(templates::REVISION_CREATED, revision_id, None)
                .await
            {
                error!(
                    "Failed to enqueue revision notification for quote {}: {}",
                    revision_id, e
                );
            }
        });

        Ok(revision)
    }
}
