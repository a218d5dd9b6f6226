//! DriftGate API - Schema Evolution Control Plane
//!
//! Governed contract evolution for event pipelines: infer the shape of each
//! incoming payload, diff it against the published contract, classify the
//! drift, and gate evolution behind human approval with a learned
//! auto-approval memory.
//!
//! PIPELINE: one POST /api/analyses runs the five stages:
//! - Stage 1 (Inference): Recursive schema tree from the raw payload
//! - Stage 2 (Diff): Structural comparison against the published contract
//! - Stage 3 (Classification): NO_CHANGE / ADDITIVE / BREAKING / UNKNOWN
//! - Stage 4 (Memory): Learned auto-approval for repeat additive patterns
//! - Stage 5 (Proposal): Next contract version parked on a PENDING approval

mod advisory;
mod approval;
mod config;
mod contract;
mod drift;
mod error;
mod history;
mod inference;
mod models;
mod pipeline;
mod routes;
mod state;
mod storage;

use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting DriftGate - Schema Evolution Control Plane...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");
    info!("🧠 Advisory mode: {:?}", settings.advisory.mode);

    let state = match AppState::new(settings.clone()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("❌ FATAL: Failed to initialize application state: {}", e);
            return Err(anyhow::anyhow!("Cannot start server: {}", e));
        }
    };

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Analysis Pipeline ───");
    info!("   POST /api/analyses                  - Analyze one payload for drift");
    info!("");
    info!("   ─── Contract Registry ───");
    info!("   GET  /api/contracts                 - List published versions");
    info!("   GET  /api/contracts/current         - Currently published contract");
    info!("   GET  /api/contracts/{{version}}       - One published version");
    info!("");
    info!("   ─── Approval Workflow ───");
    info!("   GET  /api/approvals                 - List approval records");
    info!("   GET  /api/approvals/{{id}}            - One approval record");
    info!("   POST /api/approvals/{{id}}/approve    - Publish the parked contract");
    info!("   POST /api/approvals/{{id}}/reject     - Reject the proposal");
    info!("");
    info!("   ─── Audit & Advisory ───");
    info!("   GET  /api/history                   - Recent analysis records");
    info!("   POST /api/patches                   - Propose a transform patch");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,driftgate_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
