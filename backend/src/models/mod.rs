//! Record types for the directory: donors, doctors, hospitals, donation
//! requests and the singleton settings record.

pub mod approval;
pub mod common;
pub mod doctor;
pub mod donation_request;
pub mod donor;
pub mod hospital;
pub mod record;
pub mod settings;

pub use approval::*;
pub use common::{BloodGroup, Gender, ValidationError};
pub use doctor::*;
pub use donation_request::*;
pub use donor::*;
pub use hospital::*;
pub use record::*;
pub use settings::*;
