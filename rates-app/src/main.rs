//! # Rates Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository and provider adapters
//! - Load the ISO whitelist from the provider
//! - Start the auto-refresh loop and the queue confirmer
//! - Start the HTTP server and stop everything on Ctrl+C / SIGTERM

mod config;

use std::sync::Arc;

use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rate_provider::{ProviderConfig, build_provider};
use rates_hex::RateService;
use rates_hex::inbound::{HttpServer, shutdown_signal};
use rates_hex::worker::{AutoRefresher, QueueConfirmer, shutdown_channel};
use rates_repo::build_repo;
use rates_types::{IsoWhitelist, RateProvider};

use config::{Config, LogFormat};

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking).
    // The endpoint comes from OTEL_EXPORTER_OTLP_ENDPOINT.
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .context("failed to create OTLP span exporter")?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("rates-service"), provider))
}

/// Installs the global subscriber. Returns the OTLP provider when export is
/// enabled so it can be flushed on exit.
fn init_tracing(config: &Config) -> anyhow::Result<Option<sdktrace::SdkTracerProvider>> {
    let (telemetry, otel_provider) = match config.otlp_endpoint {
        Some(_) => {
            let (tracer, provider) = init_tracer()?;
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(provider),
            )
        }
        None => (None, None),
    };

    let (text, json) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rates_app=debug,rates_hex=debug".into()),
        )
        .with(text)
        .with(json)
        .with(telemetry)
        .init();

    Ok(otel_provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let otel_provider = init_tracing(&config)?;

    tracing::info!("Starting rates server on port {}", config.port);

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;
    tracing::info!(backend = repo.backend(), "Repository ready");

    let provider = build_provider(ProviderConfig {
        base_url: config.provider_url.clone(),
        timeout: config.provider_timeout,
    })?;

    let codes = provider
        .supported_codes()
        .await
        .context("failed to load ISO codes from the rate provider")?;
    let whitelist = IsoWhitelist::new(codes);
    if whitelist.is_empty() {
        anyhow::bail!("rate provider returned no ISO codes");
    }
    tracing::info!(codes = whitelist.len(), "Loaded ISO whitelist");

    let service = Arc::new(
        RateService::new(repo, provider, whitelist).with_storage_timeout(config.storage_timeout),
    );

    // Background workers share one shutdown channel
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let refresher = tokio::spawn(
        AutoRefresher::new(
            service.clone(),
            config.refresh_interval,
            config.refresh_deadline,
        )
        .run(shutdown_rx.clone()),
    );
    let confirmer = tokio::spawn(
        QueueConfirmer::new(service.clone(), config.confirm_interval).run(shutdown_rx),
    );

    let server =
        HttpServer::with_identity(service, env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let addr = format!("0.0.0.0:{}", config.port);

    let served = server
        .run(&addr, async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await;

    // Dropping the sender on an early server error also stops the workers
    let _ = tokio::join!(refresher, confirmer);
    tracing::info!("Background workers stopped");

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    served
}
