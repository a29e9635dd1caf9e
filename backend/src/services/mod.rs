//! Service layer for domain logic that sits above the record store.
//!
//! These modules hold the pure directory and export rules plus the outbound
//! assistant client. Store orchestration lives in [`crate::db::services`].

pub mod assistant;
pub mod directory;
pub mod export;

pub use assistant::{AssistantConfig, GeminiAssistant, HealthAssistant};
pub use directory::{BloodGroupFilter, DirectoryFilter, DoctorListing};
pub use export::{DonationRequestExportRow, DonorExportRow, ExportSheet};
