//! # Repository Layer
//!
//! Repositories encapsulate the SeaORM operations for each resource. Every
//! multi-statement write runs inside a single database transaction.

pub mod apartment;
pub mod billing;
pub mod chat;
pub mod fee_service;
pub mod gate;
pub mod post;
pub mod property;
pub mod property_report;
pub mod user;
pub mod vehicle;

pub use apartment::{ApartmentChanges, ApartmentRepository, NewApartment};
pub use billing::{BillingRepository, BillingWithItems, NewBilling, NewBillingItem};
pub use chat::ChatRepository;
pub use fee_service::{FeeServiceChanges, FeeServiceRepository, NewFeeService};
pub use gate::{GateRepository, GateStatus, GateToggle};
pub use post::{FeedPage, PostRepository};
pub use property::{NewProperty, PropertyChanges, PropertyRepository};
pub use property_report::{NewPropertyReport, PropertyReportFilter, PropertyReportRepository};
pub use user::{NewUser, UserChanges, UserRepository};
pub use vehicle::{NewVehicle, VehicleRegistration, VehicleRepository, normalize_license_plate};
