//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::RateId;

// ─────────────────────────────────────────────────────────────────────────────
// Query parameters
// ─────────────────────────────────────────────────────────────────────────────

/// `?rate=CUR/BASE` query used by the stage and latest-rate endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PairQuery {
    /// Currency pair in `CUR/BASE` form
    #[param(example = "EUR/USD")]
    pub rate: Option<String>,
}

/// Parameters of a direct rate override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UpdateRateQuery {
    #[param(example = "EUR")]
    pub currency: Option<String>,
    #[param(example = "USD")]
    pub base: Option<String>,
    /// New rate, must be positive
    #[param(example = "1.08")]
    pub rate: Option<String>,
}

/// Parameters of a history window query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    #[param(example = "EUR")]
    pub currency: Option<String>,
    #[param(example = "USD")]
    pub base: Option<String>,
    /// One of 15m, 1h, 1d, 1w, 1mo
    #[param(example = "1d")]
    pub period: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// Response after staging a quote.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StageResponse {
    /// Id of the staged quote; the confirmed row keeps it
    #[serde(rename = "rateId")]
    pub rate_id: RateId,
}

/// Response after deleting a pair's history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    /// Number of history rows removed
    #[schema(example = 12)]
    pub deleted: u64,
}

/// Application identity reported by the tech endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TechState {
    #[schema(example = "rates-app")]
    pub name: String,
    #[schema(example = "0.1.0")]
    pub version: String,
}
