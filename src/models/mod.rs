//! # Data Models
//!
//! SeaORM entities for every table the apartment management API owns, plus
//! the small response types that are not tied to a table.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod apartment;
pub mod billing;
pub mod billing_item;
pub mod chat;
pub mod fee_service;
pub mod feedback;
pub mod message;
pub mod post;
pub mod property;
pub mod property_report;
pub mod user;
pub mod vehicle;
pub mod vehicle_log;

pub use apartment::Entity as Apartment;
pub use billing::Entity as Billing;
pub use billing_item::Entity as BillingItem;
pub use chat::Entity as Chat;
pub use fee_service::Entity as FeeService;
pub use feedback::Entity as Feedback;
pub use message::Entity as Message;
pub use post::Entity as Post;
pub use property::Entity as Property;
pub use property_report::Entity as PropertyReport;
pub use user::Entity as User;
pub use vehicle::Entity as Vehicle;
pub use vehicle_log::Entity as VehicleLog;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "apartments".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
