use crate::config::mongo_conf::MongoConfig;
use crate::model::comment::{Comment, CommentVisibility};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use mongodb::options::FindOptions;
use tracing::{error, info};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments are append-only; there is no update or delete.
    async fn create(&self, comment: Comment) -> RepositoryResult<Comment>;
    async fn list_by_quote(
        &self,
        quote_id: ObjectId,
        include_internal: bool,
    ) -> RepositoryResult<Vec<Comment>>;
}

pub struct MongoCommentRepository {
    collection: mongodb::Collection<Comment>,
}

impl MongoCommentRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let db = config.connect_database().await?;
        let collection = db.collection::<Comment>("comments");
        Ok(MongoCommentRepository { collection })
    }
}

#[async_trait]
impl CommentRepository for MongoCommentRepository {
    #[tracing::instrument(skip(self, comment), fields(quote_id = %comment.quote_id))]
    async fn create(&self, comment: Comment) -> RepositoryResult<Comment> {
        let mut new_comment = comment;
        new_comment.id = Some(ObjectId::new());
        new_comment.created_at = Some(chrono::Utc::now().to_rfc3339());

        match self.collection.insert_one(new_comment.clone(), None).await {
            Ok(_) => {
                info!("Comment appended");
                Ok(new_comment)
            }
            Err(e) => {
                error!("Failed to append comment: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(quote_id = %quote_id, include_internal))]
    async fn list_by_quote(
        &self,
        quote_id: ObjectId,
        include_internal: bool,
    ) -> RepositoryResult<Vec<Comment>> {
        let mut filter = doc! { "quote_id": quote_id };
        if !include_internal {
            filter.insert(
                "visibility",
                bson::to_bson(&CommentVisibility::Public)?,
            );
        }
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let mut cursor = self.collection.find(filter, options).await?;
        let mut comments = Vec::new();
        while let Some(result) = cursor.next().await {
            comments.push(result?);
        }
        Ok(comments)
    }
}
