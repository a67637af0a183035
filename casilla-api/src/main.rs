use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use casilla_api::{app, state::AppState};
use casilla_consolidation::CaptureService;
use casilla_core::payment::MockPaymentGateway;
use casilla_core::rates::FixedRateSource;
use casilla_gex::QuoteService;
use casilla_store::MemoryStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casilla_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = casilla_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Casilla API on port {}", config.server.port);

    let store = Arc::new(MemoryStore::new());

    // Stand-ins for the FX feed and the payment gateway; real adapters
    // are wired per environment.
    let rate_source = Arc::new(FixedRateSource::new(
        config.business_rules.fallback_exchange_rate,
    ));
    let gateway = Arc::new(MockPaymentGateway);

    let quotes = Arc::new(QuoteService::new(
        rate_source,
        config.business_rules.fee_schedule(),
        Duration::from_secs(config.business_rules.rate_cache_secs),
        Duration::from_secs(config.business_rules.rate_timeout_secs),
    ));
    let capture = Arc::new(CaptureService::new(
        gateway,
        Duration::from_secs(config.business_rules.gateway_timeout_secs),
    ));

    let app_state = AppState {
        packages: store.clone(),
        consolidations: store.clone(),
        warranties: store.clone(),
        quotes,
        capture,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
