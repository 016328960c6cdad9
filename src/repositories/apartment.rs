//! # Apartment Repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::apartment::{self, ActiveModel as ApartmentActiveModel, Model as ApartmentModel};
use crate::models::{Apartment, User, user};
use crate::validation::is_non_negative;

#[derive(Debug, Clone)]
pub struct NewApartment {
    pub name: String,
    pub building: Option<String>,
    pub floor: i32,
    pub area_m2: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ApartmentChanges {
    pub name: Option<String>,
    pub building: Option<Option<String>>,
    pub floor: Option<i32>,
    pub area_m2: Option<f64>,
}

/// Repository for the apartment registry
pub struct ApartmentRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ApartmentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: NewApartment) -> Result<ApartmentModel, RepositoryError> {
        let name = validate_name(&request.name)?;
        validate_area(request.area_m2)?;
        self.ensure_name_free(&name, None).await?;

        let apartment = ApartmentActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            building: Set(trim_optional(request.building)),
            floor: Set(request.floor),
            area_m2: Set(request.area_m2),
            created_at: Set(Utc::now().into()),
        };

        Ok(apartment.insert(self.db).await?)
    }

    pub async fn get(&self, apartment_id: Uuid) -> Result<ApartmentModel, RepositoryError> {
        Apartment::find_by_id(apartment_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("APARTMENT_NOT_FOUND", "apartment not found"))
    }

    pub async fn list(&self) -> Result<Vec<ApartmentModel>, RepositoryError> {
        Ok(Apartment::find()
            .order_by_asc(apartment::Column::Name)
            .all(self.db)
            .await?)
    }

    pub async fn update(
        &self,
        apartment_id: Uuid,
        changes: ApartmentChanges,
    ) -> Result<ApartmentModel, RepositoryError> {
        let mut active = self.get(apartment_id).await?.into_active_model();

        if let Some(name) = changes.name {
            let name = validate_name(&name)?;
            self.ensure_name_free(&name, Some(apartment_id)).await?;
            active.name = Set(name);
        }
        if let Some(building) = changes.building {
            active.building = Set(trim_optional(building));
        }
        if let Some(floor) = changes.floor {
            active.floor = Set(floor);
        }
        if let Some(area_m2) = changes.area_m2 {
            validate_area(area_m2)?;
            active.area_m2 = Set(area_m2);
        }

        Ok(active.update(self.db).await?)
    }

    /// Delete an apartment that has no residents left
    pub async fn delete(&self, apartment_id: Uuid) -> Result<(), RepositoryError> {
        let apartment = self.get(apartment_id).await?;

        let residents = User::find()
            .filter(user::Column::ApartmentId.eq(apartment.id))
            .count(self.db)
            .await?;
        if residents > 0 {
            return Err(RepositoryError::conflict(
                "APARTMENT_OCCUPIED",
                format!("apartment still has {residents} resident(s)"),
            ));
        }

        Apartment::delete_by_id(apartment.id).exec(self.db).await?;
        tracing::info!(apartment_id = %apartment_id, "Apartment deleted");
        Ok(())
    }

    async fn ensure_name_free(
        &self,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let mut query = Apartment::find().filter(apartment::Column::Name.eq(name));
        if let Some(apartment_id) = except {
            query = query.filter(apartment::Column::Id.ne(apartment_id));
        }

        if query.count(self.db).await? > 0 {
            return Err(RepositoryError::conflict(
                "APARTMENT_NAME_TAKEN",
                format!("apartment '{name}' already exists"),
            ));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, RepositoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation("apartment name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_area(area_m2: f64) -> Result<(), RepositoryError> {
    if !is_non_negative(area_m2) {
        return Err(RepositoryError::validation("area_m2 must be a non-negative number"));
    }
    Ok(())
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
