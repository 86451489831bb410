//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use rates_types::domain::{ConfirmedRate, HistoryPeriod, LatestRate, RateId, RateWithChange};
use rates_types::dto::{
    DeleteResponse, HistoryQuery, PairQuery, StageResponse, TechState, UpdateRateQuery,
};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Application name and version
#[utoipa::path(
    get,
    path = "/tech/state",
    tag = "health",
    responses(
        (status = 200, description = "Application identity", body = TechState)
    )
)]
async fn tech_state() {}

/// Fetch the current rate for a pair and stage it for confirmation
#[utoipa::path(
    put,
    path = "/api/v1",
    tag = "queue",
    params(PairQuery),
    responses(
        (status = 200, description = "Quote staged", body = StageResponse),
        (status = 400, description = "Malformed pair or unknown ISO code"),
        (status = 500, description = "Provider or storage failure")
    )
)]
async fn stage_quote() {}

/// Promote one staged quote into the rate history
#[utoipa::path(
    post,
    path = "/api/v1/confirm",
    tag = "queue",
    responses(
        (status = 200, description = "Quote confirmed", body = ConfirmedRate),
        (status = 204, description = "Nothing is waiting in the queue"),
        (status = 500, description = "Storage failure")
    )
)]
async fn confirm() {}

/// Get a history row by id
#[utoipa::path(
    get,
    path = "/api/v1/by-id/{id}",
    tag = "rates",
    params(
        ("id" = RateId, Path, description = "Rate ID (UUID)")
    ),
    responses(
        (status = 200, description = "History row", body = ConfirmedRate),
        (status = 204, description = "No row with this id"),
        (status = 400, description = "Malformed id")
    )
)]
async fn get_by_id() {}

/// Most recent rate for a pair
#[utoipa::path(
    get,
    path = "/api/v1/last",
    tag = "rates",
    params(PairQuery),
    responses(
        (status = 200, description = "Latest rate", body = LatestRate),
        (status = 204, description = "Pair has no history"),
        (status = 400, description = "Malformed pair or unknown ISO code")
    )
)]
async fn latest() {}

/// Latest rate of every pair with its change against the previous one
#[utoipa::path(
    get,
    path = "/api/v1/all-last",
    tag = "rates",
    responses(
        (status = 200, description = "Latest rates", body = Vec<RateWithChange>),
        (status = 500, description = "Storage failure")
    )
)]
async fn all_latest() {}

/// Override the rate of a pair, bypassing the queue
#[utoipa::path(
    patch,
    path = "/api/v1/update",
    tag = "rates",
    params(UpdateRateQuery),
    responses(
        (status = 200, description = "Rate written", body = ConfirmedRate),
        (status = 400, description = "Missing parameter, unknown ISO code or non-positive rate")
    )
)]
async fn update_rate() {}

/// Delete the whole history of a pair
#[utoipa::path(
    delete,
    path = "/api/v1/delete/{currency}/{base}",
    tag = "rates",
    params(
        ("currency" = String, Path, description = "Quoted currency ISO code"),
        ("base" = String, Path, description = "Base currency ISO code")
    ),
    responses(
        (status = 200, description = "History deleted", body = DeleteResponse),
        (status = 400, description = "Unknown ISO code")
    )
)]
async fn delete_pair() {}

/// History of a pair within a look-back window, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/history",
    tag = "rates",
    params(HistoryQuery),
    responses(
        (status = 200, description = "History rows", body = Vec<ConfirmedRate>),
        (status = 400, description = "Unknown ISO code or period")
    )
)]
async fn history() {}

/// OpenAPI documentation for the Rates API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FX Rates Service API",
        version = "1.0.0",
        description = "Fetches exchange rates from an upstream provider, stages them for confirmation and keeps an append-only history per currency pair.\n\nPairs are written `CUR/BASE`, e.g. `EUR/USD` is the price of one USD in EUR. Lookups that find nothing answer `204 No Content`.",
        license(name = "MIT"),
    ),
    paths(
        health,
        tech_state,
        stage_quote,
        confirm,
        get_by_id,
        latest,
        all_latest,
        update_rate,
        delete_pair,
        history,
    ),
    components(
        schemas(
            RateId,
            ConfirmedRate,
            LatestRate,
            RateWithChange,
            HistoryPeriod,
            StageResponse,
            DeleteResponse,
            TechState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "queue", description = "Staging and confirmation of provider quotes"),
        (name = "rates", description = "Rate history queries and overrides"),
    )
)]
pub struct ApiDoc;
