//! `medstock-core` — data model for the inventory analytics engine.
//!
//! This crate contains **plain data** and its invariants (no algorithms, no IO).

pub mod config;
pub mod entity;
pub mod error;
pub mod id;
pub mod record;

pub use config::AbcConfiguration;
pub use entity::Entity;
pub use error::{AnalyticsError, AnalyticsResult};
pub use id::ItemId;
pub use record::{AbcClass, ClinicalCriticality, InventoryRecord, CLINICAL_CRITICALITY};
