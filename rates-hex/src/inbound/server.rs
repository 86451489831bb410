//! HTTP Server configuration and startup.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use rates_types::{RateProvider, RateRepository, TechState};

use super::handlers::{self, AppState};
use crate::RateService;

/// HTTP Server for the Rates API.
pub struct HttpServer<R: RateRepository, P: RateProvider> {
    state: Arc<AppState<R, P>>,
}

impl<R: RateRepository, P: RateProvider> HttpServer<R, P> {
    /// Creates a new HTTP server sharing the given service.
    pub fn new(service: Arc<RateService<R, P>>) -> Self {
        Self::with_identity(service, env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Creates a new HTTP server reporting the given name and version on
    /// `/tech/state`.
    pub fn with_identity(
        service: Arc<RateService<R, P>>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                tech: TechState {
                    name: name.into(),
                    version: version.into(),
                },
            }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any);

        Router::new()
            .route("/health", get(handlers::health))
            .route("/tech/state", get(handlers::tech_state::<R, P>))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .route("/api/v1", put(handlers::stage_quote::<R, P>))
            .route("/api/v1/confirm", post(handlers::confirm::<R, P>))
            .route("/api/v1/by-id/{id}", get(handlers::get_by_id::<R, P>))
            .route("/api/v1/last", get(handlers::latest::<R, P>))
            .route("/api/v1/all-last", get(handlers::all_latest::<R, P>))
            .route("/api/v1/update", patch(handlers::update_rate::<R, P>))
            .route(
                "/api/v1/delete/{currency}/{base}",
                delete(handlers::delete_pair::<R, P>),
            )
            .route("/api/v1/history", get(handlers::history::<R, P>))
            .layer(metrics)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address until `shutdown` resolves, then
    /// drains in-flight requests.
    pub async fn run(
        self,
        addr: &str,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
