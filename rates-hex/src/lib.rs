//! # Rates Hex
//!
//! Application service layer, background workers and HTTP adapter for the
//! FX rates service.
//!
//! ## Architecture
//!
//! - `service/` - Application service (orchestrates provider and repository)
//! - `worker/` - Auto-refresh loop and confirmation scheduler
//! - `inbound/` - HTTP adapter (Axum server)
//! - `openapi/` - OpenAPI document served at `/api-docs/openapi.json`
//!
//! The service is generic over `R: RateRepository` and `P: RateProvider`,
//! allowing different adapters to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;
pub mod worker;

#[cfg(test)]
mod service_tests;

pub use service::{DEFAULT_STORAGE_TIMEOUT, RateService};
