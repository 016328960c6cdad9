//! # Fee Service Repository
//!
//! Billable services. Prices are integers in the smallest currency unit.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::fee_service::{
    self, ActiveModel as FeeServiceActiveModel, Model as FeeServiceModel,
};
use crate::models::{BillingItem, FeeService, billing_item};
use crate::validation::is_valid_tax_percentage;

/// Largest unit price a service may carry
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000_000;

#[derive(Debug, Clone)]
pub struct NewFeeService {
    pub name: String,
    pub unit_price: i64,
    pub unit: String,
    pub tax_percentage: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FeeServiceChanges {
    pub name: Option<String>,
    pub unit_price: Option<i64>,
    pub unit: Option<String>,
    pub tax_percentage: Option<f64>,
}

pub struct FeeServiceRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> FeeServiceRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: NewFeeService) -> Result<FeeServiceModel, RepositoryError> {
        let name = non_empty("name", &request.name)?;
        let unit = non_empty("unit", &request.unit)?;
        validate_price(request.unit_price)?;
        validate_tax(request.tax_percentage)?;
        self.ensure_name_free(&name, None).await?;

        let service = FeeServiceActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            unit_price: Set(request.unit_price),
            unit: Set(unit),
            tax_percentage: Set(request.tax_percentage),
            created_at: Set(Utc::now().into()),
        };

        Ok(service.insert(self.db).await?)
    }

    pub async fn get(&self, service_id: Uuid) -> Result<FeeServiceModel, RepositoryError> {
        FeeService::find_by_id(service_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("SERVICE_NOT_FOUND", "service not found"))
    }

    pub async fn list(&self) -> Result<Vec<FeeServiceModel>, RepositoryError> {
        Ok(FeeService::find()
            .order_by_asc(fee_service::Column::Name)
            .all(self.db)
            .await?)
    }

    /// Update a service. Issued billings keep the price they were created with.
    pub async fn update(
        &self,
        service_id: Uuid,
        changes: FeeServiceChanges,
    ) -> Result<FeeServiceModel, RepositoryError> {
        let mut active = self.get(service_id).await?.into_active_model();

        if let Some(name) = changes.name {
            let name = non_empty("name", &name)?;
            self.ensure_name_free(&name, Some(service_id)).await?;
            active.name = Set(name);
        }
        if let Some(unit_price) = changes.unit_price {
            validate_price(unit_price)?;
            active.unit_price = Set(unit_price);
        }
        if let Some(unit) = changes.unit {
            active.unit = Set(non_empty("unit", &unit)?);
        }
        if let Some(tax_percentage) = changes.tax_percentage {
            validate_tax(tax_percentage)?;
            active.tax_percentage = Set(tax_percentage);
        }

        Ok(active.update(self.db).await?)
    }

    /// Delete a service that no billing refers to
    pub async fn delete(&self, service_id: Uuid) -> Result<(), RepositoryError> {
        let service = self.get(service_id).await?;

        let usages = BillingItem::find()
            .filter(billing_item::Column::ServiceId.eq(service.id))
            .count(self.db)
            .await?;
        if usages > 0 {
            return Err(RepositoryError::conflict(
                "SERVICE_IN_USE",
                "service is referenced by existing billings",
            ));
        }

        FeeService::delete_by_id(service.id).exec(self.db).await?;
        Ok(())
    }

    async fn ensure_name_free(
        &self,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let mut query = FeeService::find().filter(fee_service::Column::Name.eq(name));
        if let Some(service_id) = except {
            query = query.filter(fee_service::Column::Id.ne(service_id));
        }

        if query.count(self.db).await? > 0 {
            return Err(RepositoryError::conflict(
                "SERVICE_NAME_TAKEN",
                format!("service '{name}' already exists"),
            ));
        }
        Ok(())
    }
}

fn non_empty(field: &str, value: &str) -> Result<String, RepositoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn validate_price(unit_price: i64) -> Result<(), RepositoryError> {
    if unit_price < 0 {
        return Err(RepositoryError::validation("unit_price must not be negative"));
    }
    if unit_price > MAX_UNIT_PRICE {
        return Err(RepositoryError::validation(format!(
            "unit_price must not exceed {MAX_UNIT_PRICE}"
        )));
    }
    Ok(())
}

fn validate_tax(tax_percentage: f64) -> Result<(), RepositoryError> {
    if !is_valid_tax_percentage(tax_percentage) {
        return Err(RepositoryError::validation(
            "tax_percentage must be between 0 and 100",
        ));
    }
    Ok(())
}
