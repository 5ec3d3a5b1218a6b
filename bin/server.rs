// Calify - Web Server
// Local JSON API over one in-memory day ledger

use anyhow::{Context, Result};
use calify::api::{router, AppState};
use calify::{logging, Config, NutritionLedger, VoiceIntake};

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let resolver = config.resolver()?;
    tracing::info!(
        foods = resolver.database().count(),
        goal = config.daily_goal.calories,
        "Food table ready"
    );

    let state = AppState::new(VoiceIntake::new(resolver, NutritionLedger::new()), config.daily_goal);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "Server running, API under /api");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
