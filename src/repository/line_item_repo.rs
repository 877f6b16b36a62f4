use crate::config::mongo_conf::MongoConfig;
use crate::model::line_item::LineItem;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use tracing::{error, info};

#[async_trait]
pub trait LineItemRepository: Send + Sync {
    async fn create_many(&self, items: Vec<LineItem>) -> RepositoryResult<Vec<LineItem>>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<LineItem>;
    async fn list_by_quote(&self, quote_id: ObjectId) -> RepositoryResult<Vec<LineItem>>;
    async fn set_material(&self, id: ObjectId, material_id: ObjectId)
        -> RepositoryResult<LineItem>;
    async fn set_cutting_price(
        &self,
        id: ObjectId,
        amount: f64,
        production_time_hours: Option<f64>,
    ) -> RepositoryResult<LineItem>;
    async fn set_customer_price(&self, id: ObjectId, amount: f64) -> RepositoryResult<LineItem>;
}

pub struct MongoLineItemRepository {
    collection: mongodb::Collection<LineItem>,
}

impl MongoLineItemRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let db = config.connect_database().await?;
        let collection = db.collection::<LineItem>("line_items");
        Ok(MongoLineItemRepository { collection })
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }

    async fn update_one(
        &self,
        id: ObjectId,
        set: bson::Document,
    ) -> RepositoryResult<LineItem> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?;
        updated.ok_or_else(|| RepositoryError::not_found(format!("Line item not found: {}", id)))
    }
}

#[async_trait]
impl LineItemRepository for MongoLineItemRepository {
    #[tracing::instrument(skip(self, items), fields(count = items.len()))]
    async fn create_many(&self, items: Vec<LineItem>) -> RepositoryResult<Vec<LineItem>> {
        let now = Self::now();
        let items: Vec<LineItem> = items
            .into_iter()
            .map(|mut item| {
                item.id = Some(ObjectId::new());
                item.created_at = Some(now.clone());
                item.updated_at = Some(now.clone());
                item
            })
            .collect();
        if items.is_empty() {
            return Ok(items);
        }
        match self.collection.insert_many(items.clone(), None).await {
            Ok(_) => {
                info!("Inserted {} line items", items.len());
                Ok(items)
            }
            Err(e) => {
                error!("Failed to insert line items: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<LineItem> {
        let found = self.collection.find_one(doc! { "_id": id }, None).await?;
        found.ok_or_else(|| RepositoryError::not_found(format!("Line item not found: {}", id)))
    }

    #[tracing::instrument(skip(self), fields(quote_id = %quote_id))]
    async fn list_by_quote(&self, quote_id: ObjectId) -> RepositoryResult<Vec<LineItem>> {
        let mut cursor = self
            .collection
            .find(doc! { "quote_id": quote_id }, None)
            .await?;
        let mut items = Vec::new();
        while let Some(result) = cursor.next().await {
            items.push(result?);
        }
        Ok(items)
    }

    #[tracing::instrument(skip(self), fields(id = %id, material_id = %material_id))]
    async fn set_material(
        &self,
        id: ObjectId,
        material_id: ObjectId,
    ) -> RepositoryResult<LineItem> {
        self.update_one(
            id,
            doc! { "material_id": material_id, "updated_at": Self::now() },
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(id = %id, amount))]
    async fn set_cutting_price(
        &self,
        id: ObjectId,
        amount: f64,
        production_time_hours: Option<f64>,
    ) -> RepositoryResult<LineItem> {
        let mut set = doc! { "cutting_price": amount, "updated_at": Self::now() };
        if let Some(hours) = production_time_hours {
            set.insert("production_time_hours", hours);
        }
        self.update_one(id, set).await
    }

    #[tracing::instrument(skip(self), fields(id = %id, amount))]
    async fn set_customer_price(&self, id: ObjectId, amount: f64) -> RepositoryResult<LineItem> {
        self.update_one(
            id,
            doc! { "customer_price": amount, "updated_at": Self::now() },
        )
        .await
    }
}
