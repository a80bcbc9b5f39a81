//! Gastos Bot - Telegram expense logger backed by Google Sheets
//!
//! Startup order: config -> spreadsheet -> categories -> Telegram. Any
//! failure before polling starts is fatal; after that, per-message failures
//! are answered in chat and the loop keeps going.

use gastos_bot::api::{create_router, AppState};
use gastos_bot::core::{AuthorizationGate, CategoryRegistry, Command, Dispatcher, ExpenseBot};
use gastos_bot::models::config::{log_dir_from_env, BotConfig};
use gastos_bot::providers::{SheetsClient, TelegramClient};
use gastos_bot::utils::constants::{APP_NAME, APP_VERSION};
use gastos_bot::utils::logging::log_file_appender;
use gastos_bot::utils::telemetry::BotStats;

use eyre::{Result, WrapErr};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Console plus `bot_gastos.log`. The guard must live until exit or the
/// file writer drops buffered lines.
fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    let file_appender = log_file_appender(log_dir).wrap_err("opening log file")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════╗
    ║                                              ║
    ║        💸  {} v{:<8}                  ║
    ║     Telegram  →  Google Sheets expenses      ║
    ║                                              ║
    ╚══════════════════════════════════════════════╝
    "#,
        APP_NAME, APP_VERSION
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let _log_guard = init_logging(&log_dir_from_env())?;

    print_banner();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(code = e.code_str(), "❌ Invalid configuration: {}", e);
            return Err(e).wrap_err("configuration");
        }
    };
    info!(
        "👥 {} authorized user(s), logs in {}",
        config.authorized_users.len(),
        config.log_dir.display()
    );

    // Storage must be reachable before we accept any message
    let sheets = Arc::new(
        SheetsClient::connect(&config.sheets)
            .await
            .wrap_err("connecting to Google Sheets")?,
    );
    let registry = Arc::new(
        CategoryRegistry::load(sheets.as_ref())
            .await
            .wrap_err("loading categories")?,
    );

    let telegram = TelegramClient::connect(&config.telegram_token, config.poll_timeout)
        .await
        .wrap_err("connecting to Telegram")?;
    if let Err(e) = telegram.register_commands(&Command::menu()).await {
        warn!(code = e.code_str(), "⚠️ Could not register command menu: {}", e);
    }

    let stats = Arc::new(BotStats::new());
    let dispatcher = Arc::new(Dispatcher::new(
        AuthorizationGate::new(config.authorized_users.iter().copied()),
        registry.clone(),
        sheets.clone(),
        stats.clone(),
        config.sheets.expenses_sheet.clone(),
    ));

    // Ctrl+C fans out to the poll loop and the status server
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("🛑 Ctrl+C received");
        let _ = shutdown_tx.send(true);
    });

    let server = match config.http_port {
        Some(port) => {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = TcpListener::bind(addr)
                .await
                .wrap_err_with(|| format!("binding status API on {}", addr))?;
            let app = create_router(Arc::new(AppState::new(stats.clone(), registry.len())));
            let mut rx = shutdown_rx.clone();

            info!("🌐 Status API on http://{} (GET /health, /v1/stats)", addr);
            Some(tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = rx.wait_for(|stop| *stop).await;
                    })
                    .await
            }))
        }
        None => None,
    };

    let bot = ExpenseBot::new(telegram, dispatcher);
    let mut rx = shutdown_rx.clone();
    let result = bot
        .run_until(async move {
            let _ = rx.wait_for(|stop| *stop).await;
        })
        .await;

    if let Some(handle) = server {
        if result.is_err() {
            handle.abort();
        } else if let Ok(Err(e)) = handle.await {
            warn!("⚠️ Status API stopped with error: {}", e);
        }
    }

    let snapshot = stats.snapshot();
    info!("📊 Final stats: {}", snapshot.summary());
    if let Some(dir) = &config.stats_dir {
        match stats.export_stats_json(dir) {
            Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
            Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
        }
    }

    result.wrap_err("polling Telegram")?;
    info!("👋 {} stopped", APP_NAME);
    Ok(())
}
