//! HTTP request handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use utoipa::OpenApi;

use rates_types::{
    AppError, CurrencyPair, DeleteResponse, DomainError, HistoryPeriod, HistoryQuery, PairQuery,
    RateId, RateProvider, RateRepository, StageResponse, TechState, UpdateRateQuery,
};

use crate::RateService;
use crate::openapi::ApiDoc;

/// Application state shared across handlers.
pub struct AppState<R: RateRepository, P: RateProvider> {
    pub service: Arc<RateService<R, P>>,
    pub tech: TechState,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err.into())
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({
        "error": message,
        "code": status.as_u16()
    });

    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            // absence is not a failure for this API
            AppError::NotFound(_) | AppError::EmptyQueue => StatusCode::NO_CONTENT.into_response(),
            AppError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, &msg),
            AppError::UnknownIsoCode { code, valid } => {
                let body = serde_json::json!({
                    "error": format!("unexpected iso code {}", code),
                    "code": StatusCode::BAD_REQUEST.as_u16(),
                    "valid_codes": valid,
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AppError::Provider(detail) => {
                tracing::error!(error = %detail, "Rate provider call failed");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to fetch rate from provider",
                )
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter helpers
// ─────────────────────────────────────────────────────────────────────────────

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(format!("parameter {} is required", name))),
    }
}

fn pair_param(query: &PairQuery) -> Result<CurrencyPair, ApiError> {
    Ok(CurrencyPair::parse(required(&query.rate, "rate")?)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Ambient endpoints
// ─────────────────────────────────────────────────────────────────────────────

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Application name and version.
pub async fn tech_state<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
) -> impl IntoResponse {
    Json(state.tech.clone())
}

/// OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ─────────────────────────────────────────────────────────────────────────────
// Rates API
// ─────────────────────────────────────────────────────────────────────────────

/// Fetch the current rate for a pair and stage it.
#[tracing::instrument(skip(state))]
pub async fn stage_quote<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(query): Query<PairQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = pair_param(&query)?;
    let rate_id = state.service.stage_quote(&pair).await?;
    Ok(Json(StageResponse { rate_id }))
}

/// Promote one staged quote into the history.
#[tracing::instrument(skip(state))]
pub async fn confirm<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state.service.confirm().await?;
    Ok(Json(row))
}

#[tracing::instrument(skip(state), fields(rate_id = %id))]
pub async fn get_by_id<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rate_id = RateId::from_str(&id)
        .map_err(|_| AppError::BadRequest(format!("invalid rate id {:?}", id)))?;

    let row = state.service.get_by_id(rate_id).await?;
    Ok(Json(row))
}

#[tracing::instrument(skip(state))]
pub async fn latest<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(query): Query<PairQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = pair_param(&query)?;
    let rate = state.service.latest(&pair).await?;
    Ok(Json(rate))
}

#[tracing::instrument(skip(state))]
pub async fn all_latest<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
) -> Result<impl IntoResponse, ApiError> {
    let rates = state.service.all_latest_with_change().await?;
    Ok(Json(rates))
}

/// Operator override of a pair's rate.
#[tracing::instrument(skip(state))]
pub async fn update_rate<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(query): Query<UpdateRateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let currency = required(&query.currency, "currency")?;
    let base = required(&query.base, "base")?;
    let raw_rate = required(&query.rate, "rate")?;
    let rate = Decimal::from_str(raw_rate)
        .map_err(|_| DomainError::InvalidRate(raw_rate.to_string()))?;

    let row = state
        .service
        .update_rate(&CurrencyPair::new(currency, base), rate)
        .await?;
    Ok(Json(row))
}

#[tracing::instrument(skip(state))]
pub async fn delete_pair<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path((currency, base)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .service
        .delete_pair(&CurrencyPair::new(currency, base))
        .await?;
    Ok(Json(DeleteResponse { deleted }))
}

#[tracing::instrument(skip(state))]
pub async fn history<R: RateRepository, P: RateProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let currency = required(&query.currency, "currency")?;
    let base = required(&query.base, "base")?;
    let period = HistoryPeriod::from_str(required(&query.period, "period")?)?;

    let rows = state
        .service
        .history(&CurrencyPair::new(currency, base), period)
        .await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_is_no_content() {
        let response = ApiError(AppError::NotFound("Rate EUR/USD".into())).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = ApiError(AppError::EmptyQueue).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_iso_lists_valid_codes() {
        let response = ApiError(AppError::UnknownIsoCode {
            code: "XXX".into(),
            valid: vec!["EUR".into(), "USD".into()],
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "unexpected iso code XXX");
        assert_eq!(json["valid_codes"], serde_json::json!(["EUR", "USD"]));
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let response =
            ApiError(AppError::Internal("connection refused at 10.0.0.3".into())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "internal server error");
        assert_eq!(json["code"], 500);
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(&None, "rate").is_err());
        assert!(required(&Some("  ".into()), "rate").is_err());
        assert_eq!(required(&Some("EUR/USD".into()), "rate").unwrap(), "EUR/USD");
    }
}
