#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;

use kerf_backend::config::RateLimitConfig;
use kerf_backend::dto::quote_dto::{CreateLineItemRequest, CreateQuoteRequest, QuoteDetailsDto};
use kerf_backend::handler::quote_handler::QuoteHandlerState;
use kerf_backend::model::actor::{Actor, Role};
use kerf_backend::model::comment::{Comment, CommentVisibility};
use kerf_backend::model::line_item::LineItem;
use kerf_backend::model::material::Material;
use kerf_backend::model::quote::{PaymentStatus, Quote, QuoteStatus, QuoteTotals};
use kerf_backend::repository::comment_repo::CommentRepository;
use kerf_backend::repository::line_item_repo::LineItemRepository;
use kerf_backend::repository::material_repo::MaterialRepository;
use kerf_backend::repository::quote_repo::QuoteRepository;
use kerf_backend::repository::repository_error::{RepositoryError, RepositoryResult};
use kerf_backend::service::material_service::MaterialServiceImpl;
use kerf_backend::service::pricing_service::PricingServiceImpl;
use kerf_backend::service::quote_service::{QuoteService, QuoteServiceImpl};
use kerf_backend::service::revision_service::RevisionServiceImpl;
use kerf_backend::util::notification::{NotificationError, NotificationService};
use kerf_backend::util::rate_limit::InMemoryRateLimiter;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// In-process QuoteRepository with the same contract as the Mongo one,
/// including single compare-and-swap claim semantics under the lock.
pub struct InMemoryQuoteRepository {
    quotes: Mutex<Vec<Quote>>,
    seq: AtomicI64,
    /// When set, update_totals fails; used to exercise the best-effort
    /// recompute path.
    pub fail_update_totals: AtomicBool,
}

impl InMemoryQuoteRepository {
    pub fn new() -> Self {
        InMemoryQuoteRepository {
            quotes: Mutex::new(Vec::new()),
            seq: AtomicI64::new(0),
            fail_update_totals: AtomicBool::new(false),
        }
    }

    fn with_quote<R>(
        &self,
        id: ObjectId,
        f: impl FnOnce(&mut Quote) -> R,
    ) -> RepositoryResult<R> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .iter_mut()
            .find(|q| q.id == Some(id))
            .ok_or_else(|| RepositoryError::not_found(format!("Quote not found: {}", id)))?;
        Ok(f(quote))
    }
}

#[async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn create(&self, quote: Quote) -> RepositoryResult<Quote> {
        let mut new_quote = quote;
        new_quote.id = Some(ObjectId::new());
        let stamp = now();
        new_quote.created_at = Some(stamp.clone());
        new_quote.updated_at = Some(stamp);
        self.quotes.lock().unwrap().push(new_quote.clone());
        Ok(new_quote)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote> {
        self.with_quote(id, |q| q.clone())
    }

    async fn list(&self, page: u32, limit: u32) -> RepositoryResult<Vec<Quote>> {
        let page = page.max(1) as u64;
        let limit = limit.clamp(1, 100) as u64;
        let quotes = self.quotes.lock().unwrap();
        Ok(quotes
            .iter()
            .rev()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: ObjectId, status: QuoteStatus) -> RepositoryResult<Quote> {
        self.with_quote(id, |q| {
            let stamp = now();
            q.status = status;
            q.updated_at = Some(stamp.clone());
            match status {
                QuoteStatus::Sent => q.sent_at = Some(stamp),
                QuoteStatus::Accepted => q.accepted_at = Some(stamp),
                QuoteStatus::Declined => q.declined_at = Some(stamp),
                _ => {}
            }
            q.clone()
        })
    }

    async fn claim(&self, id: ObjectId, operator_id: ObjectId) -> RepositoryResult<bool> {
        self.with_quote(id, |q| {
            if q.operator_id.is_none() {
                q.operator_id = Some(operator_id);
                q.updated_at = Some(now());
                true
            } else {
                false
            }
        })
    }

    async fn update_totals(&self, id: ObjectId, totals: QuoteTotals) -> RepositoryResult<Quote> {
        if self.fail_update_totals.load(Ordering::SeqCst) {
            return Err(RepositoryError::database("Totals write refused"));
        }
        self.with_quote(id, |q| {
            q.total_cutting_price = totals.total_cutting_price;
            q.total_customer_price = totals.total_customer_price;
            q.production_time_hours = totals.production_time_hours;
            q.updated_at = Some(now());
            q.clone()
        })
    }

    async fn update_payment(
        &self,
        id: ObjectId,
        status: PaymentStatus,
        reference: Option<String>,
    ) -> RepositoryResult<Quote> {
        self.with_quote(id, |q| {
            q.payment_status = status;
            q.payment_reference = reference;
            q.updated_at = Some(now());
            q.clone()
        })
    }

    async fn next_quote_number(&self) -> RepositoryResult<String> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("Q{:06}", seq))
    }
}

pub struct InMemoryLineItemRepository {
    items: Mutex<Vec<LineItem>>,
}

impl InMemoryLineItemRepository {
    pub fn new() -> Self {
        InMemoryLineItemRepository {
            items: Mutex::new(Vec::new()),
        }
    }

    fn with_item<R>(
        &self,
        id: ObjectId,
        f: impl FnOnce(&mut LineItem) -> R,
    ) -> RepositoryResult<R> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == Some(id))
            .ok_or_else(|| RepositoryError::not_found(format!("Line item not found: {}", id)))?;
        Ok(f(item))
    }
}

#[async_trait]
impl LineItemRepository for InMemoryLineItemRepository {
    async fn create_many(&self, items: Vec<LineItem>) -> RepositoryResult<Vec<LineItem>> {
        let mut stored = self.items.lock().unwrap();
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let mut new_item = item;
            new_item.id = Some(ObjectId::new());
            let stamp = now();
            new_item.created_at = Some(stamp.clone());
            new_item.updated_at = Some(stamp);
            stored.push(new_item.clone());
            created.push(new_item);
        }
        Ok(created)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<LineItem> {
        self.with_item(id, |i| i.clone())
    }

    async fn list_by_quote(&self, quote_id: ObjectId) -> RepositoryResult<Vec<LineItem>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|i| i.quote_id == quote_id)
            .cloned()
            .collect())
    }

    async fn set_material(
        &self,
        id: ObjectId,
        material_id: ObjectId,
    ) -> RepositoryResult<LineItem> {
        self.with_item(id, |i| {
            i.material_id = Some(material_id);
            i.updated_at = Some(now());
            i.clone()
        })
    }

    async fn set_cutting_price(
        &self,
        id: ObjectId,
        amount: f64,
        production_time_hours: Option<f64>,
    ) -> RepositoryResult<LineItem> {
        self.with_item(id, |i| {
            i.cutting_price = Some(amount);
            if production_time_hours.is_some() {
                i.production_time_hours = production_time_hours;
            }
            i.updated_at = Some(now());
            i.clone()
        })
    }

    async fn set_customer_price(&self, id: ObjectId, amount: f64) -> RepositoryResult<LineItem> {
        self.with_item(id, |i| {
            i.customer_price = Some(amount);
            i.updated_at = Some(now());
            i.clone()
        })
    }
}

pub struct InMemoryMaterialRepository {
    materials: Mutex<Vec<Material>>,
}

impl InMemoryMaterialRepository {
    pub fn new() -> Self {
        InMemoryMaterialRepository {
            materials: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MaterialRepository for InMemoryMaterialRepository {
    async fn create(&self, material: Material) -> RepositoryResult<Material> {
        let mut new_material = material;
        new_material.id = Some(ObjectId::new());
        let stamp = now();
        new_material.created_at = Some(stamp.clone());
        new_material.updated_at = Some(stamp);
        self.materials.lock().unwrap().push(new_material.clone());
        Ok(new_material)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Material> {
        let materials = self.materials.lock().unwrap();
        materials
            .iter()
            .find(|m| m.id == Some(id))
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Material not found: {}", id)))
    }

    async fn list(&self, active_only: bool) -> RepositoryResult<Vec<Material>> {
        let materials = self.materials.lock().unwrap();
        Ok(materials
            .iter()
            .filter(|m| !active_only || m.is_active)
            .cloned()
            .collect())
    }

    async fn deactivate(&self, id: ObjectId) -> RepositoryResult<Material> {
        let mut materials = self.materials.lock().unwrap();
        let material = materials
            .iter_mut()
            .find(|m| m.id == Some(id))
            .ok_or_else(|| RepositoryError::not_found(format!("Material not found: {}", id)))?;
        material.is_active = false;
        material.updated_at = Some(now());
        Ok(material.clone())
    }
}

pub struct InMemoryCommentRepository {
    comments: Mutex<Vec<Comment>>,
    /// When set, create fails; used to show comment failures never fail
    /// the operation that appended them.
    pub fail_create: AtomicBool,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        InMemoryCommentRepository {
            comments: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
        }
    }

    pub fn all(&self) -> Vec<Comment> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(&self, comment: Comment) -> RepositoryResult<Comment> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RepositoryError::database("Comment write refused"));
        }
        let mut new_comment = comment;
        new_comment.id = Some(ObjectId::new());
        new_comment.created_at = Some(now());
        self.comments.lock().unwrap().push(new_comment.clone());
        Ok(new_comment)
    }

    async fn list_by_quote(
        &self,
        quote_id: ObjectId,
        include_internal: bool,
    ) -> RepositoryResult<Vec<Comment>> {
        let comments = self.comments.lock().unwrap();
        Ok(comments
            .iter()
            .filter(|c| c.quote_id == quote_id)
            .filter(|c| include_internal || c.visibility == CommentVisibility::Public)
            .cloned()
            .collect())
    }
}

/// Records enqueued notifications instead of delivering them.
pub struct RecordingNotificationService {
    sent: Mutex<Vec<(String, ObjectId)>>,
}

impl RecordingNotificationService {
    pub fn new() -> Self {
        RecordingNotificationService {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, ObjectId)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationService for RecordingNotificationService {
    async fn enqueue(
        &self,
        template_id: &str,
        quote_id: ObjectId,
        _recipient_override: Option<String>,
    ) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap()
            .push((template_id.to_string(), quote_id));
        Ok(())
    }
}

/// Everything a service test needs, wired the same way the app wires it
/// but against in-memory collaborators.
pub struct TestContext {
    pub quote_repo: Arc<InMemoryQuoteRepository>,
    pub line_item_repo: Arc<InMemoryLineItemRepository>,
    pub material_repo: Arc<InMemoryMaterialRepository>,
    pub comment_repo: Arc<InMemoryCommentRepository>,
    pub notifications: Arc<RecordingNotificationService>,
    pub quote_service: QuoteServiceImpl,
    pub pricing_service: PricingServiceImpl,
    pub revision_service: RevisionServiceImpl,
    pub material_service: MaterialServiceImpl,
}

pub fn harness() -> TestContext {
    // High ceiling so only the rate-limit tests trip the limiter.
    harness_with_rate_limit(RateLimitConfig {
        max_attempts: 10_000,
        window_secs: 3600,
        redis_key_prefix: "rate_limit:".to_string(),
    })
}

pub fn harness_with_rate_limit(config: RateLimitConfig) -> TestContext {
    let quote_repo = Arc::new(InMemoryQuoteRepository::new());
    let line_item_repo = Arc::new(InMemoryLineItemRepository::new());
    let material_repo = Arc::new(InMemoryMaterialRepository::new());
    let comment_repo = Arc::new(InMemoryCommentRepository::new());
    let notifications = Arc::new(RecordingNotificationService::new());
    let rate_limiter = Arc::new(InMemoryRateLimiter::new(config));

    let quote_service = QuoteServiceImpl::new(
        quote_repo.clone(),
        line_item_repo.clone(),
        comment_repo.clone(),
        notifications.clone(),
        rate_limiter.clone(),
    );
    let pricing_service = PricingServiceImpl::new(
        quote_repo.clone(),
        line_item_repo.clone(),
        material_repo.clone(),
    );
    let revision_service = RevisionServiceImpl::new(
        quote_repo.clone(),
        line_item_repo.clone(),
        comment_repo.clone(),
        notifications.clone(),
    );
    let material_service = MaterialServiceImpl::new(material_repo.clone());

    TestContext {
        quote_repo,
        line_item_repo,
        material_repo,
        comment_repo,
        notifications,
        quote_service,
        pricing_service,
        revision_service,
        material_service,
    }
}

/// Quote routes wired against the context's in-memory collaborators, the
/// way the app assembles them.
pub fn quote_routes(ctx: &TestContext) -> axum::Router {
    let rate_limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_attempts: 10_000,
        window_secs: 3600,
        redis_key_prefix: "rate_limit:".to_string(),
    }));
    let quote_service = Arc::new(QuoteServiceImpl::new(
        ctx.quote_repo.clone(),
        ctx.line_item_repo.clone(),
        ctx.comment_repo.clone(),
        ctx.notifications.clone(),
        rate_limiter,
    ));
    let revision_service = Arc::new(RevisionServiceImpl::new(
        ctx.quote_repo.clone(),
        ctx.line_item_repo.clone(),
        ctx.comment_repo.clone(),
        ctx.notifications.clone(),
    ));
    kerf_backend::router::quote_router::quote_router(QuoteHandlerState {
        quote_service,
        revision_service,
    })
}

pub fn webhook_routes(ctx: &TestContext) -> axum::Router {
    let rate_limiter = Arc::new(InMemoryRateLimiter::new(RateLimitConfig {
        max_attempts: 10_000,
        window_secs: 3600,
        redis_key_prefix: "rate_limit:".to_string(),
    }));
    let quote_service = Arc::new(QuoteServiceImpl::new(
        ctx.quote_repo.clone(),
        ctx.line_item_repo.clone(),
        ctx.comment_repo.clone(),
        ctx.notifications.clone(),
        rate_limiter,
    ));
    kerf_backend::router::webhook_router::webhook_router(quote_service)
}

pub fn customer() -> Actor {
    Actor::new(ObjectId::new(), Role::Customer)
}

pub fn operator() -> Actor {
    Actor::new(ObjectId::new(), Role::Operator)
}

pub fn admin() -> Actor {
    Actor::new(ObjectId::new(), Role::Admin)
}

pub fn item_request(filename: &str, quantity: u32) -> CreateLineItemRequest {
    CreateLineItemRequest {
        file_path: format!("uploads/{}", filename),
        original_filename: filename.to_string(),
        quantity,
    }
}

/// Registers a quote with `quantities.len()` line items through the
/// regular intake path.
pub async fn seed_quote(
    ctx: &TestContext,
    customer: &Actor,
    quantities: &[u32],
) -> QuoteDetailsDto {
    let items = quantities
        .iter()
        .enumerate()
        .map(|(i, &qty)| item_request(&format!("part-{}.dxf", i + 1), qty))
        .collect();
    ctx.quote_service
        .register_quote(
            customer,
            CreateQuoteRequest {
                customer_id: None,
                deadline: None,
                shipping_address: Some("12 Mill Road".to_string()),
                items,
            },
        )
        .await
        .expect("intake should succeed")
}

/// Walks a quote through the given statuses as an admin.
pub async fn advance(ctx: &TestContext, quote_id: ObjectId, statuses: &[QuoteStatus]) -> Quote {
    let acting_admin = admin();
    let mut quote = ctx
        .quote_repo
        .get_by_id(quote_id)
        .await
        .expect("quote should exist");
    for &status in statuses {
        quote = ctx
            .quote_service
            .update_status(&acting_admin, quote_id, status)
            .await
            .expect("admin transition should succeed");
    }
    quote
}
