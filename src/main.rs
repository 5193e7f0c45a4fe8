mod admin;
mod app;
mod auth;
mod config;
mod error;
mod problems;
mod state;
mod storage;

use anyhow::Context;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "urbanmap=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&state.db).await {
        tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
    }

    if let Some(seed_file) = state.config.admin_seed_file.clone() {
        auth::seed::seed_admins(&state.db, &seed_file)
            .await
            .context("seed admin accounts")?;
    }

    let config = state.config.clone();
    let app = app::build_app(state);
    app::serve(app, &config).await
}
