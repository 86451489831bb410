//! # Rates Types
//!
//! Domain types and port traits for the FX rates service.
//! This crate has ZERO external IO dependencies - only data structures,
//! validation rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (CurrencyPair, StagedQuote, ConfirmedRate)
//!   plus the ISO whitelist and the change calculator
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain, provider and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ConfirmedRate, CurrencyPair, HistoryPeriod, IsoWhitelist, LatestRate, RateId, RateWithChange,
    StagedQuote, change_percent,
};
pub use dto::*;
pub use error::{AppError, DomainError, ProviderError, RepoError};
pub use ports::{RateProvider, RateRepository};
