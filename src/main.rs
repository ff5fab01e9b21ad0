use std::sync::Arc;

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use kyc_onboard::config::ServerConfig;
use kyc_onboard::onboarding::{
    LogNotifier, OnboardingManager, OnboardingRouteState, RandomDecisions, onboarding_routes,
};
use kyc_onboard::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("🏦 KYC Onboard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}/api", config.bind_addr());
    eprintln!(
        "   Simulated latency: {}",
        if config.onboarding.simulate_latency {
            "on"
        } else {
            "off"
        }
    );

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Onboarding ───────────────────────────────────────────────────────
    let manager = Arc::new(OnboardingManager::new(
        db,
        Arc::new(RandomDecisions),
        Arc::new(LogNotifier),
        config.onboarding.clone(),
    ));

    let app = onboarding_routes(OnboardingRouteState { manager }).layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!(addr = %config.bind_addr(), "KYC onboarding server started");
    axum::serve(listener, app).await?;

    Ok(())
}
