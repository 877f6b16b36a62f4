use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{info, instrument};

use crate::model::actor::{Actor, Role};
use crate::model::material::Material;
use crate::repository::material_repo::MaterialRepository;
use crate::util::error::ServiceError;

#[async_trait]
pub trait MaterialService: Send + Sync {
    async fn create_material(
        &self,
        actor: &Actor,
        name: String,
        thickness_mm: f64,
        price_per_sqm: f64,
    ) -> Result<Material, ServiceError>;
    async fn get_material(&self, id: ObjectId) -> Result<Material, ServiceError>;
    async fn list_materials(&self, active_only: bool) -> Result<Vec<Material>, ServiceError>;
    async fn deactivate_material(
        &self,
        actor: &Actor,
        id: ObjectId,
    ) -> Result<Material, ServiceError>;
}

pub struct MaterialServiceImpl {
    pub material_repo: Arc<dyn MaterialRepository>,
}

impl MaterialServiceImpl {
    pub fn new(material_repo: Arc<dyn MaterialRepository>) -> Self {
        MaterialServiceImpl { material_repo }
    }

    fn require_admin(actor: &Actor) -> Result<(), ServiceError> {
        if actor.role != Role::Admin {
            return Err(ServiceError::Authorization(
                "Only admins manage materials".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MaterialService for MaterialServiceImpl {
    #[instrument(skip(self, actor), fields(name = %name, role = %actor.role))]
    async fn create_material(
        &self,
        actor: &Actor,
        name: String,
        thickness_mm: f64,
        price_per_sqm: f64,
    ) -> Result<Material, ServiceError> {
        Self::require_admin(actor)?;
        if thickness_mm <= 0.0 {
            return Err(ServiceError::Validation(
                "Material thickness must be positive".to_string(),
            ));
        }
        if price_per_sqm < 0.0 {
            return Err(ServiceError::Validation(
                "Material price must not be negative".to_string(),
            ));
        }
        let material = self
            .material_repo
            .create(Material {
                id: None,
                name,
                thickness_mm,
                price_per_sqm,
                is_active: true,
                created_at: None,
                updated_at: None,
            })
            .await?;
        info!("Material '{}' created", material.name);
        Ok(material)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_material(&self, id: ObjectId) -> Result<Material, ServiceError> {
        Ok(self.material_repo.get_by_id(id).await?)
    }

    #[instrument(skip(self), fields(active_only))]
    async fn list_materials(&self, active_only: bool) -> Result<Vec<Material>, ServiceError> {
        Ok(self.material_repo.list(active_only).await?)
    }

    #[instrument(skip(self, actor), fields(id = %id, role = %actor.role))]
    async fn deactivate_material(
        &self,
        actor: &Actor,
        id: ObjectId,
    ) -> Result<Material, ServiceError> {
        Self::require_admin(actor)?;
        let material = self.material_repo.deactivate(id).await?;
        info!("Material '{}' deactivated", material.name);
        Ok(material)
    }
}
