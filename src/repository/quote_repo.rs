use crate::config::mongo_conf::MongoConfig;
use crate::model::quote::{PaymentStatus, Quote, QuoteStatus, QuoteTotals};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::stream::StreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use tracing::{error, info};

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: Quote) -> RepositoryResult<Quote>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote>;
    async fn list(&self, page: u32, limit: u32) -> RepositoryResult<Vec<Quote>>;
    /// Sets the status, bumps updated_at, and stamps the first-entry
    /// timestamp for sent/accepted/declined.
    async fn update_status(&self, id: ObjectId, status: QuoteStatus) -> RepositoryResult<Quote>;
    /// Atomically assigns operator_id if and only if it is still unset.
    /// One compare-and-swap; returns false when the filter did not match
    /// (already claimed). Never a read-then-write pair.
    async fn claim(&self, id: ObjectId, operator_id: ObjectId) -> RepositoryResult<bool>;
    async fn update_totals(&self, id: ObjectId, totals: QuoteTotals) -> RepositoryResult<Quote>;
    async fn update_payment(
        &self,
        id: ObjectId,
        status: PaymentStatus,
        reference: Option<String>,
    ) -> RepositoryResult<Quote>;
    /// Next value of the source-generated quote number sequence,
    /// formatted as e.g. Q000123.
    async fn next_quote_number(&self) -> RepositoryResult<String>;
}

pub struct MongoQuoteRepository {
    collection: mongodb::Collection<Quote>,
    counters: mongodb::Collection<Document>,
}

impl MongoQuoteRepository {
    /// Create a new MongoQuoteRepository using MongoConfig
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let db = config.connect_database().await?;
        let collection = db.collection::<Quote>("quotes");
        let counters = db.collection::<Document>("counters");
        Ok(MongoQuoteRepository {
            collection,
            counters,
        })
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[async_trait]
impl QuoteRepository for MongoQuoteRepository {
    #[tracing::instrument(skip(self, quote), fields(quote_number = %quote.quote_number))]
    async fn create(&self, quote: Quote) -> RepositoryResult<Quote> {
        let mut new_quote = quote;
        new_quote.id = Some(ObjectId::new());
        let now = Self::now();
        new_quote.created_at = Some(now.clone());
        new_quote.updated_at = Some(now);

        match self.collection.insert_one(new_quote.clone(), None).await {
            Ok(_) => {
                info!("Quote created successfully");
                Ok(new_quote)
            }
            Err(e) => {
                error!("Failed to create quote: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Quote> {
        let found = self.collection.find_one(doc! { "_id": id }, None).await?;
        found.ok_or_else(|| RepositoryError::not_found(format!("Quote not found: {}", id)))
    }

    #[tracing::instrument(skip(self), fields(page, limit))]
    async fn list(&self, page: u32, limit: u32) -> RepositoryResult<Vec<Quote>> {
        let page = page.max(1) as u64;
        let limit = limit.clamp(1, 100) as u64;
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip((page - 1) * limit)
            .limit(limit as i64)
            .build();
        let mut cursor = self.collection.find(doc! {}, options).await?;
        let mut quotes = Vec::new();
        while let Some(result) = cursor.next().await {
            quotes.push(result?);
        }
        Ok(quotes)
    }

    #[tracing::instrument(skip(self), fields(id = %id, status = %status))]
    async fn update_status(&self, id: ObjectId, status: QuoteStatus) -> RepositoryResult<Quote> {
        let now = Self::now();
        let mut set = doc! {
            "status": bson::to_bson(&status)?,
            "updated_at": &now,
        };
        // First entry only; the transition table forbids re-entering these.
        match status {
            QuoteStatus::Sent => set.insert("sent_at", &now),
            QuoteStatus::Accepted => set.insert("accepted_at", &now),
            QuoteStatus::Declined => set.insert("declined_at", &now),
            _ => None,
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?;
        match updated {
            Some(quote) => {
                info!("Quote status updated");
                Ok(quote)
            }
            None => Err(RepositoryError::not_found(format!("Quote not found: {}", id))),
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, operator_id = %operator_id))]
    async fn claim(&self, id: ObjectId, operator_id: ObjectId) -> RepositoryResult<bool> {
        // The operator_id: null filter makes this a single conditional
        // update; a racing claim loses by matching nothing.
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "operator_id": bson::Bson::Null },
                doc! { "$set": { "operator_id": operator_id, "updated_at": Self::now() } },
                None,
            )
            .await?;
        Ok(updated.is_some())
    }

    #[tracing::instrument(skip(self, totals), fields(id = %id))]
    async fn update_totals(&self, id: ObjectId, totals: QuoteTotals) -> RepositoryResult<Quote> {
        let set = doc! {
            "total_cutting_price": bson::to_bson(&totals.total_cutting_price)?,
            "total_customer_price": bson::to_bson(&totals.total_customer_price)?,
            "production_time_hours": bson::to_bson(&totals.production_time_hours)?,
            "updated_at": Self::now(),
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?;
        updated.ok_or_else(|| RepositoryError::not_found(format!("Quote not found: {}", id)))
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn update_payment(
        &self,
        id: ObjectId,
        status: PaymentStatus,
        reference: Option<String>,
    ) -> RepositoryResult<Quote> {
        let set = doc! {
            "payment_status": bson::to_bson(&status)?,
            "payment_reference": bson::to_bson(&reference)?,
            "updated_at": Self::now(),
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?;
        updated.ok_or_else(|| RepositoryError::not_found(format!("Quote not found: {}", id)))
    }

    #[tracing::instrument(skip(self))]
    async fn next_quote_number(&self) -> RepositoryResult<String> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": "quote_number" },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?;
        let seq = counter
            .and_then(|d| d.get_i64("seq").ok())
            .ok_or_else(|| RepositoryError::database("Quote number counter missing"))?;
        Ok(format!("Q{:06}", seq))
    }
}
