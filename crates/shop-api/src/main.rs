//! # Storefront RS
//!
//! Storefront backend: login, sessions, bearer tokens and payments.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export JWT_SECRET_KEY=...   # at least 32 bytes
//! export SESSION_KEY=...      # at least 32 bytes, different from JWT_SECRET_KEY
//! export STRIPE_SERVER_KEY=sk_test_...   # optional
//! export ENDPOINT_SECRET=whsec_...
//!
//! # Run the server
//! storefront
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Auth strategies: {:?}", state.gate.strategies());
    info!(
        "Payment provider: {}",
        state.payment_provider().unwrap_or("disabled")
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🛒 Storefront starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("🔑 Login: POST http://{}/auth/login", addr);
        info!("🔔 Webhook: POST http://{}/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 Storefront RS 🛒
  ━━━━━━━━━━━━━━━━━━━━━━━
  Sessions, tokens, payments
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
