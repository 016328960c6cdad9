//! Database migrations for the apartment management API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_05_000001_create_apartments;
mod m2026_01_05_000002_create_users;
mod m2026_01_05_000003_create_properties;
mod m2026_01_05_000004_create_property_reports;
mod m2026_01_05_000005_create_services;
mod m2026_01_05_000006_create_billings;
mod m2026_01_05_000007_create_posts;
mod m2026_01_05_000008_create_chats;
mod m2026_01_05_000009_create_vehicles;
mod m2026_01_05_000010_add_vehicle_log_open_guard;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_05_000001_create_apartments::Migration),
            Box::new(m2026_01_05_000002_create_users::Migration),
            Box::new(m2026_01_05_000003_create_properties::Migration),
            Box::new(m2026_01_05_000004_create_property_reports::Migration),
            Box::new(m2026_01_05_000005_create_services::Migration),
            Box::new(m2026_01_05_000006_create_billings::Migration),
            Box::new(m2026_01_05_000007_create_posts::Migration),
            Box::new(m2026_01_05_000008_create_chats::Migration),
            Box::new(m2026_01_05_000009_create_vehicles::Migration),
            Box::new(m2026_01_05_000010_add_vehicle_log_open_guard::Migration),
        ]
    }
}
