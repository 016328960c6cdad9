//! # Vehicle Repository
//!
//! Registering a vehicle writes a `vehicle` property and the vehicle row in
//! one transaction. A user owns at most one vehicle and license plates are
//! unique after normalization.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::property::{
    ActiveModel as PropertyActiveModel, Model as PropertyModel, PropertyKind, PropertyStatus,
};
use crate::models::vehicle::{self, ActiveModel as VehicleActiveModel, Model as VehicleModel};
use crate::models::{Property, User, Vehicle};
use crate::validation::is_valid_year;

const MAX_PLATE_LEN: usize = 16;

/// Canonical form of a license plate: trimmed, upper-cased, no whitespace.
pub fn normalize_license_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub owner_id: Uuid,
    pub license_plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    /// Free text stored on the backing property
    pub description: Option<String>,
}

/// A vehicle together with the property that backs it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VehicleRegistration {
    pub vehicle: VehicleModel,
    pub property: PropertyModel,
}

pub struct VehicleRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> VehicleRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn register(
        &self,
        request: NewVehicle,
    ) -> Result<VehicleRegistration, RepositoryError> {
        let license_plate = normalize_license_plate(&request.license_plate);
        if license_plate.is_empty() {
            return Err(RepositoryError::validation("license_plate cannot be empty"));
        }
        if license_plate.chars().count() > MAX_PLATE_LEN
            || !license_plate.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(RepositoryError::validation(format!(
                "license_plate '{license_plate}' is not valid"
            )));
        }
        if let Some(year) = request.year.filter(|year| !is_valid_year(*year)) {
            return Err(RepositoryError::validation(format!("year {year} is out of range")));
        }

        User::find_by_id(request.owner_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("USER_NOT_FOUND", "user not found"))?;

        if self.find_for_user(request.owner_id).await?.is_some() {
            return Err(already_registered());
        }

        let plate_taken = Vehicle::find()
            .filter(vehicle::Column::LicensePlate.eq(license_plate.as_str()))
            .count(self.db)
            .await?
            > 0;
        if plate_taken {
            return Err(plate_conflict(&license_plate));
        }

        let brand = trim_optional(request.brand);
        let model = trim_optional(request.model);
        let property_name = match (&brand, &model) {
            (Some(brand), Some(model)) => format!("{brand} {model} ({license_plate})"),
            (Some(name), None) | (None, Some(name)) => format!("{name} ({license_plate})"),
            (None, None) => license_plate.clone(),
        };

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let property = PropertyActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(request.owner_id),
            name: Set(property_name),
            kind: Set(PropertyKind::Vehicle),
            description: Set(trim_optional(request.description)),
            status: Set(PropertyStatus::default()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let vehicle = VehicleActiveModel {
            id: Set(Uuid::new_v4()),
            property_id: Set(property.id),
            owner_id: Set(request.owner_id),
            license_plate: Set(license_plate.clone()),
            brand: Set(brand),
            model: Set(model),
            year: Set(request.year),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(|err| map_plate_violation(err, &license_plate))?;

        txn.commit().await?;

        tracing::info!(
            vehicle_id = %vehicle.id,
            property_id = %property.id,
            owner_id = %vehicle.owner_id,
            license_plate = %vehicle.license_plate,
            "Vehicle registered"
        );
        Ok(VehicleRegistration { vehicle, property })
    }

    pub async fn find_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VehicleModel>, RepositoryError> {
        Ok(Vehicle::find()
            .filter(vehicle::Column::OwnerId.eq(user_id))
            .order_by_asc(vehicle::Column::CreatedAt)
            .one(self.db)
            .await?)
    }

    /// The user's vehicle with its backing property
    pub async fn get_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<VehicleRegistration, RepositoryError> {
        let vehicle = self.find_for_user(user_id).await?.ok_or_else(vehicle_not_found)?;
        self.with_property(vehicle).await
    }

    pub async fn get(&self, vehicle_id: Uuid) -> Result<VehicleModel, RepositoryError> {
        Vehicle::find_by_id(vehicle_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("VEHICLE_NOT_FOUND", "vehicle not found"))
    }

    pub async fn list(&self) -> Result<Vec<VehicleModel>, RepositoryError> {
        Ok(Vehicle::find()
            .order_by_asc(vehicle::Column::LicensePlate)
            .all(self.db)
            .await?)
    }

    async fn with_property(
        &self,
        vehicle: VehicleModel,
    ) -> Result<VehicleRegistration, RepositoryError> {
        let property = Property::find_by_id(vehicle.property_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("PROPERTY_NOT_FOUND", "property not found"))?;

        Ok(VehicleRegistration { vehicle, property })
    }
}

pub(crate) fn vehicle_not_found() -> RepositoryError {
    RepositoryError::not_found("VEHICLE_NOT_FOUND", "vehicle not found for this user")
}

fn already_registered() -> RepositoryError {
    RepositoryError::conflict(
        "VEHICLE_ALREADY_REGISTERED",
        "user already has a registered vehicle",
    )
}

fn plate_conflict(license_plate: &str) -> RepositoryError {
    RepositoryError::conflict(
        "LICENSE_PLATE_TAKEN",
        format!("license plate {license_plate} is already registered"),
    )
}

// The pre-checks run outside the transaction, so a concurrent registration
// can still reach the unique index.
fn map_plate_violation(err: DbErr, license_plate: &str) -> RepositoryError {
    if is_unique_violation(&err) {
        plate_conflict(license_plate)
    } else {
        err.into()
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_license_plate() {
        assert_eq!(normalize_license_plate("  b 1234 xyz "), "B1234XYZ");
        assert_eq!(normalize_license_plate("ab-12\t34"), "AB-1234");
        assert_eq!(normalize_license_plate("   "), "");
    }

    #[test]
    fn test_conflict_codes() {
        assert!(matches!(
            already_registered(),
            RepositoryError::Conflict { code: "VEHICLE_ALREADY_REGISTERED", .. }
        ));
        assert!(matches!(
            plate_conflict("B1234XYZ"),
            RepositoryError::Conflict { code: "LICENSE_PLATE_TAKEN", .. }
        ));
    }
}
