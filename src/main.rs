//! # Work Schedule Bot Main Entry Point
//!
//! Initializes logging, loads configuration, prepares the database and calendar,
//! starts the recompute worker and sweep, and runs the Telegram bot next to the
//! health server.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use work_schedule_bot::bot::handlers::BotHandler;
use work_schedule_bot::config::Config;
use work_schedule_bot::database::connection::DatabaseManager;
use work_schedule_bot::services::health::HealthService;
use work_schedule_bot::services::sweep::RecomputeSweep;
use work_schedule_bot::services::user::AdminGrant;
use work_schedule_bot::services::Services;
use work_schedule_bot::utils::datetime::SystemClock;
use work_schedule_bot::utils::logging::log_system_event;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "work_schedule_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    info!("Starting Work Schedule Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}",
        config.database_url, config.http_port
    );

    // Initialize database
    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    // Engine services and the recompute worker
    let (services, worker) =
        Services::new(db_arc.clone(), config.engine_settings(), Arc::new(SystemClock));
    let worker_task = worker.spawn();

    let requeued = services.queue.requeue_pending().await?;
    if requeued > 0 {
        log_system_event("Requeued pending recomputes", Some(&requeued.to_string()));
    }

    // Calendar and schedules
    let grant = AdminGrant::system();
    if Path::new(&config.calendar_path).exists() {
        let stored = services
            .calendar
            .load_from_feed(&grant, &config.calendar_path)
            .await?;
        log_system_event(
            "Calendar loaded",
            Some(&format!("{} non-working days from {}", stored, config.calendar_path)),
        );
    } else {
        warn!(
            "Calendar feed {} not found, keeping the stored snapshot",
            config.calendar_path
        );
    }

    let report = services
        .schedules
        .generate_for_year(&grant, config.platform_epoch_year, config.default_minutes_per_day)
        .await?;
    info!(
        "Schedules for {}: {} created, {} updated, {} unchanged",
        config.platform_epoch_year, report.created, report.updated, report.unchanged
    );

    let reconciled = services.schedules.reconcile_all_from_calendar(&grant).await?;
    if reconciled > 0 {
        info!("Reconciled {} schedules with the calendar", reconciled);
    }

    if let Some(chat_id) = config.base_admin_chat_id {
        match services.users.ensure_admin(chat_id).await {
            Ok(true) => log_system_event("Base admin ensured", Some(&chat_id.to_string())),
            Ok(false) => info!("Base admin chat {} is already an admin or not registered yet", chat_id),
            Err(e) => warn!("Failed to promote base admin {}: {}", chat_id, e),
        }
    }

    // Recompute sweep
    info!("Initializing recompute sweep...");
    let mut sweep = match RecomputeSweep::new(services.queue.clone(), &config.recompute_sweep_cron)
        .await
    {
        Ok(sweep) => sweep,
        Err(e) => {
            tracing::error!("Failed to create recompute sweep: {}", e);
            return Err(anyhow::anyhow!("Failed to create recompute sweep: {}", e));
        }
    };

    if let Err(e) = sweep.start().await {
        tracing::error!("Failed to start recompute sweep: {}", e);
    } else {
        info!("Recompute sweep started successfully");
    }

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);
    let handler = BotHandler::new(services.clone(), config.calendar_path.clone());
    info!("Telegram bot initialized successfully");

    // Initialize health service
    let health_service = HealthService::new(db_arc.clone(), services.queue.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    // Run both the bot and health server concurrently
    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result2 = health_task => {
            if let Err(e) = result2 {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = sweep.stop().await {
        tracing::warn!("Error stopping recompute sweep: {}", e);
    }

    // Let queued recomputes finish before the worker goes away
    services.queue.flush().await;
    worker_task.abort();

    info!("Application stopped");
    Ok(())
}
