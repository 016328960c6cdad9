//! Test utilities for database testing.
//!
//! Builds in-memory SQLite databases with all migrations applied and seeds
//! the rows most tests need.

use anyhow::Result;
use apartments::models::user::{Model as UserModel, UserRole};
use apartments::repositories::{
    NewUser, NewVehicle, UserRepository, VehicleRegistration, VehicleRepository,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// Creates a resident with a unique email address.
#[allow(dead_code)]
pub async fn create_resident(db: &DatabaseConnection, full_name: &str) -> Result<UserModel> {
    create_user(db, full_name, UserRole::Resident).await
}

/// Creates an administrator with a unique email address.
#[allow(dead_code)]
pub async fn create_admin(db: &DatabaseConnection) -> Result<UserModel> {
    create_user(db, "Building Admin", UserRole::Admin).await
}

async fn create_user(
    db: &DatabaseConnection,
    full_name: &str,
    role: UserRole,
) -> Result<UserModel> {
    let user = UserRepository::new(db)
        .create(NewUser {
            full_name: full_name.to_string(),
            email: unique_email("user"),
            phone: "+62 812 3456 7890".to_string(),
            role,
            apartment_id: None,
        })
        .await?;
    Ok(user)
}

/// Registers a vehicle for `owner_id` with the given plate.
#[allow(dead_code)]
pub async fn register_vehicle(
    db: &DatabaseConnection,
    owner_id: Uuid,
    license_plate: &str,
) -> Result<VehicleRegistration> {
    let registration = VehicleRepository::new(db)
        .register(NewVehicle {
            owner_id,
            license_plate: license_plate.to_string(),
            brand: Some("Toyota".to_string()),
            model: Some("Avanza".to_string()),
            year: Some(2021),
            description: None,
        })
        .await?;
    Ok(registration)
}
