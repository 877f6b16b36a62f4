use crate::config::mongo_conf::MongoConfig;
use crate::model::material::Material;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use tracing::{error, info};

#[async_trait]
pub trait MaterialRepository: Send + Sync {
    async fn create(&self, material: Material) -> RepositoryResult<Material>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Material>;
    async fn list(&self, active_only: bool) -> RepositoryResult<Vec<Material>>;
    /// Soft delete; the material stays resolvable for historic line items.
    async fn deactivate(&self, id: ObjectId) -> RepositoryResult<Material>;
}

pub struct MongoMaterialRepository {
    collection: mongodb::Collection<Material>,
}

impl MongoMaterialRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let db = config.connect_database().await?;
        let collection = db.collection::<Material>("materials");
        Ok(MongoMaterialRepository { collection })
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[async_trait]
impl MaterialRepository for MongoMaterialRepository {
    #[tracing::instrument(skip(self, material), fields(name = %material.name))]
    async fn create(&self, material: Material) -> RepositoryResult<Material> {
        let mut new_material = material;
        new_material.id = Some(ObjectId::new());
        new_material.is_active = true;
        let now = Self::now();
        new_material.created_at = Some(now.clone());
        new_material.updated_at = Some(now);

        match self.collection.insert_one(new_material.clone(), None).await {
            Ok(_) => {
                info!("Material created successfully");
                Ok(new_material)
            }
            Err(e) => {
                error!("Failed to create material: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Material> {
        let found = self.collection.find_one(doc! { "_id": id }, None).await?;
        found.ok_or_else(|| RepositoryError::not_found(format!("Material not found: {}", id)))
    }

    #[tracing::instrument(skip(self), fields(active_only))]
    async fn list(&self, active_only: bool) -> RepositoryResult<Vec<Material>> {
        let filter = if active_only {
            doc! { "is_active": true }
        } else {
            doc! {}
        };
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let mut cursor = self.collection.find(filter, options).await?;
        let mut materials = Vec::new();
        while let Some(result) = cursor.next().await {
            materials.push(result?);
        }
        Ok(materials)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn deactivate(&self, id: ObjectId) -> RepositoryResult<Material> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "is_active": false, "updated_at": Self::now() } },
                options,
            )
            .await?;
        updated.ok_or_else(|| RepositoryError::not_found(format!("Material not found: {}", id)))
    }
}
