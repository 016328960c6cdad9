//! # Apartments API Library
//!
//! This library provides the core functionality for the apartment management
//! service: residents, properties, billing, the social feed, messaging,
//! per-user documents and vehicle gate logging.

pub mod auth;
pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod storage;
pub mod telemetry;
pub mod validation;
pub use migration;
