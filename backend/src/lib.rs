//! # HemoCare Backend
//!
//! Directory service for a blood donation network: donors, doctors,
//! hospitals and donation requests, with an admin approval workflow.
//!
//! ## Features
//!
//! - **Public directory**: approved donors filtered by blood group and a
//!   name/address search, plus doctors and hospitals
//! - **Registration**: donors and donation requests enter a pending queue
//! - **Approval workflow**: admins approve (one-way) or reject (delete)
//! - **Settings**: a singleton record with the central contact number
//! - **Exports**: spreadsheet-ready projections of approved records
//! - **Health assistant**: short answers from a hosted language model
//!
//! ## Architecture
//!
//! - [`api`]: record and DTO types shared across layers
//! - [`models`]: records, update DTOs and their validation
//! - [`db`]: record store traits, backends, service layer and seeding
//! - [`services`]: directory filtering, export projections, assistant client
//! - [`auth`]: admin bearer token verification
//! - [`config`]: server configuration from the environment
//! - [`http`]: axum router and handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
