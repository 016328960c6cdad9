//! # Property Repository
//!
//! Generic property registry. Vehicle properties are created through
//! [`super::VehicleRepository::register`] so that the vehicle row is written in
//! the same transaction.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::property::{
    self, ActiveModel as PropertyActiveModel, Model as PropertyModel, PropertyKind,
    PropertyStatus,
};
use crate::models::{Property, User, Vehicle, VehicleLog, vehicle};

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

pub struct PropertyRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PropertyRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a non-vehicle property; its status starts as `found`
    pub async fn create(&self, request: NewProperty) -> Result<PropertyModel, RepositoryError> {
        let name = validate_name(&request.name)?;

        User::find_by_id(request.owner_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("USER_NOT_FOUND", "owner not found"))?;

        let now = Utc::now();
        let property = PropertyActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(request.owner_id),
            name: Set(name),
            kind: Set(PropertyKind::Other),
            description: Set(request.description.filter(|d| !d.trim().is_empty())),
            status: Set(PropertyStatus::default()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(property.insert(self.db).await?)
    }

    pub async fn get(&self, property_id: Uuid) -> Result<PropertyModel, RepositoryError> {
        Property::find_by_id(property_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("PROPERTY_NOT_FOUND", "property not found"))
    }

    /// List properties, optionally only those of one owner
    pub async fn list(
        &self,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<PropertyModel>, RepositoryError> {
        let mut query = Property::find();
        if let Some(owner_id) = owner_id {
            query = query.filter(property::Column::OwnerId.eq(owner_id));
        }

        Ok(query
            .order_by_desc(property::Column::CreatedAt)
            .order_by_desc(property::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn update(
        &self,
        property_id: Uuid,
        changes: PropertyChanges,
    ) -> Result<PropertyModel, RepositoryError> {
        let mut active = self.get(property_id).await?.into_active_model();

        if let Some(name) = changes.name {
            active.name = Set(validate_name(&name)?);
        }
        if let Some(description) = changes.description {
            active.description = Set(description.filter(|d| !d.trim().is_empty()));
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(self.db).await?)
    }

    /// Delete a property. A vehicle property whose vehicle has passed the
    /// gate keeps its history and cannot be deleted.
    pub async fn delete(&self, property_id: Uuid) -> Result<(), RepositoryError> {
        let property = self.get(property_id).await?;

        if property.kind == PropertyKind::Vehicle {
            let gate_entries = VehicleLog::find()
                .inner_join(Vehicle)
                .filter(vehicle::Column::PropertyId.eq(property.id))
                .count(self.db)
                .await?;
            if gate_entries > 0 {
                return Err(RepositoryError::conflict(
                    "PROPERTY_HAS_GATE_HISTORY",
                    "vehicle has gate history and cannot be deleted",
                ));
            }
        }

        Property::delete_by_id(property.id).exec(self.db).await?;
        tracing::info!(property_id = %property_id, kind = ?property.kind, "Property deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, RepositoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation("property name cannot be empty"));
    }
    if trimmed.len() > 255 {
        return Err(RepositoryError::validation(
            "property name cannot exceed 255 characters",
        ));
    }
    Ok(trimmed.to_string())
}

