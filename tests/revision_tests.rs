mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use kerf_backend::model::comment::CommentVisibility;
use kerf_backend::model::quote::{PaymentStatus, QuoteStatus};
use kerf_backend::repository::line_item_repo::LineItemRepository;
use kerf_backend::repository::quote_repo::QuoteRepository;
use kerf_backend::service::pricing_service::PricingService;
use kerf_backend::service::revision_service::RevisionService;
use kerf_backend::util::error::ServiceError;
use kerf_backend::util::notification::templates;

use common::{admin, advance, customer, harness, operator, seed_quote, TestContext};

/// Seeds a quote, prices it and walks it to sent.
async fn sent_quote(ctx: &TestContext) -> bson::oid::ObjectId {
    let acting_admin = admin();
    let details = seed_quote(ctx, &customer(), &[2, 1]).await;
    let quote_id = details.quote.id.unwrap();

    advance(ctx, quote_id, &[QuoteStatus::NeedsAttention]).await;
    for item in &details.line_items {
        ctx.pricing_service
            .set_cutting_price(&acting_admin, item.id.unwrap(), 10.0, Some(1.0))
            .await
            .unwrap();
    }
    advance(ctx, quote_id, &[QuoteStatus::ReadyForPricing]).await;
    for item in &details.line_items {
        ctx.pricing_service
            .set_customer_price(&acting_admin, item.id.unwrap(), 18.0)
            .await
            .unwrap();
    }
    advance(ctx, quote_id, &[QuoteStatus::Sent]).await;
    quote_id
}

#[tokio::test]
async fn a_revision_forks_the_quote_for_repricing() {
    let ctx = harness();
    let original_id = sent_quote(&ctx).await;
    let original = ctx.quote_repo.get_by_id(original_id).await.unwrap();

    let revision = ctx
        .revision_service
        .create_revision(&admin(), original_id, Some("thicker sheet".to_string()))
        .await
        .unwrap();

    assert_eq!(revision.quote_number, format!("{}-R1", original.quote_number));
    assert_eq!(revision.revision_number, 1);
    assert_eq!(revision.parent_quote_id, Some(original_id));
    assert_eq!(revision.status, QuoteStatus::ReadyForPricing);
    assert_eq!(revision.customer_id, original.customer_id);
    assert_eq!(revision.payment_status, PaymentStatus::Unpaid);
    assert!(revision.sent_at.is_none());

    // Costs carry over; the sale side must be re-priced.
    assert_eq!(revision.total_cutting_price, original.total_cutting_price);
    assert_eq!(revision.total_customer_price, None);

    // The original is left untouched.
    let original_after = ctx.quote_repo.get_by_id(original_id).await.unwrap();
    assert_eq!(original_after.status, QuoteStatus::Sent);
    assert_eq!(original_after.total_customer_price, Some(54.0));
}

#[tokio::test]
async fn cloned_line_items_keep_costs_but_drop_sale_prices() {
    let ctx = harness();
    let original_id = sent_quote(&ctx).await;

    let revision = ctx
        .revision_service
        .create_revision(&admin(), original_id, None)
        .await
        .unwrap();

    let originals = ctx.line_item_repo.list_by_quote(original_id).await.unwrap();
    let clones = ctx
        .line_item_repo
        .list_by_quote(revision.id.unwrap())
        .await
        .unwrap();
    assert_eq!(clones.len(), originals.len());
    for (original, clone) in originals.iter().zip(&clones) {
        assert_eq!(clone.quantity, original.quantity);
        assert_eq!(clone.cutting_price, original.cutting_price);
        assert_eq!(clone.file_path, original.file_path);
        assert_eq!(clone.customer_price, None);
    }
}

#[tokio::test]
async fn every_revision_points_at_the_lineage_root() {
    let ctx = harness();
    let root_id = sent_quote(&ctx).await;
    let root = ctx.quote_repo.get_by_id(root_id).await.unwrap();

    let acting_admin = admin();
    let first = ctx
        .revision_service
        .create_revision(&acting_admin, root_id, None)
        .await
        .unwrap();

    // Price and send the first revision, then revise it again.
    let first_id = first.id.unwrap();
    let clones = ctx.line_item_repo.list_by_quote(first_id).await.unwrap();
    for item in &clones {
        ctx.pricing_service
            .set_customer_price(&acting_admin, item.id.unwrap(), 25.0)
            .await
            .unwrap();
    }
    advance(&ctx, first_id, &[QuoteStatus::Sent]).await;

    let second = ctx
        .revision_service
        .create_revision(&acting_admin, first_id, None)
        .await
        .unwrap();

    assert_eq!(second.revision_number, 2);
    assert_eq!(second.quote_number, format!("{}-R2", root.quote_number));
    // Not the first revision's id: the lineage is a fan, not a chain.
    assert_eq!(second.parent_quote_id, Some(root_id));
}

#[tokio::test]
async fn only_admins_fork_revisions() {
    let ctx = harness();
    let original_id = sent_quote(&ctx).await;

    for actor in [customer(), operator()] {
        let result = ctx
            .revision_service
            .create_revision(&actor, original_id, None)
            .await;
        assert!(matches!(result, Err(ServiceError::Authorization(_))));
    }
}

#[tokio::test]
async fn only_sent_quotes_can_be_revised() {
    let ctx = harness();
    let details = seed_quote(&ctx, &customer(), &[1]).await;
    let quote_id = details.quote.id.unwrap();

    let result = ctx
        .revision_service
        .create_revision(&admin(), quote_id, None)
        .await;
    assert!(matches!(result, Err(ServiceError::StateConflict(_))));
}

#[tokio::test]
async fn the_fork_leaves_an_audit_trail_on_both_quotes() {
    let ctx = harness();
    let original_id = sent_quote(&ctx).await;

    let revision = ctx
        .revision_service
        .create_revision(&admin(), original_id, Some("new deadline".to_string()))
        .await
        .unwrap();

    let comments = ctx.comment_repo.all();
    let on_original: Vec<_> = comments
        .iter()
        .filter(|c| c.quote_id == original_id)
        .collect();
    let on_revision: Vec<_> = comments
        .iter()
        .filter(|c| c.quote_id == revision.id.unwrap())
        .collect();
    assert_eq!(on_original.len(), 1);
    assert_eq!(on_revision.len(), 1);
    assert_eq!(on_original[0].visibility, CommentVisibility::Internal);
    assert!(on_original[0].content.contains(&revision.quote_number));
    assert!(on_original[0].content.contains("new deadline"));
}

#[tokio::test]
async fn a_failed_audit_comment_never_fails_the_fork() {
    let ctx = harness();
    let original_id = sent_quote(&ctx).await;
    ctx.comment_repo.fail_create.store(true, Ordering::SeqCst);

    let revision = ctx
        .revision_service
        .create_revision(&admin(), original_id, None)
        .await
        .unwrap();
    assert_eq!(revision.revision_number, 1);
}

#[tokio::test]
async fn the_customer_is_notified_of_the_new_revision() {
    let ctx = harness();
    let original_id = sent_quote(&ctx).await;

    let revision = ctx
        .revision_service
        .create_revision(&admin(), original_id, None)
        .await
        .unwrap();

    // Enqueueing is spawned off the request path.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let sent = ctx.notifications.sent();
    assert!(sent
        .iter()
        .any(|(template, id)| template == templates::REVISION_CREATED
            && *id == revision.id.unwrap()));
}
