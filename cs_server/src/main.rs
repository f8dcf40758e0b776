//! Chefshare authentication API server.
//!
//! Wires the auth core to Postgres, the email notifier and the background
//! sweepers, then serves the HTTP API until Ctrl+C.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Error};
use chefshare::{
    auth::{Argon2Hasher, AuthService, TokenService},
    db::Database,
    maintenance::Sweeper,
    notify::{LogNotifier, NotificationQueue, Notifier, ResendNotifier},
    security::{RateLimit, SlidingWindowLimiter},
};
use cs_server::{
    api::{self, AppState},
    config::{DEFAULT_BIND, DEFAULT_DATABASE_URL, ServerConfig},
    logging,
};
use pico_args::Arguments;
use tracing::{info, warn};

const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

fn help() -> String {
    format!(
        "\
Run the Chefshare authentication API server

USAGE:
  cs_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or {DEFAULT_BIND}]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or {DEFAULT_DATABASE_URL}]

FLAGS:
  --migrate                Apply pending schema migrations before serving
  -h, --help               Print help information

ENVIRONMENT:
  JWT_SECRET               JWT signing secret (required, at least 32 chars)
  PASSWORD_PEPPER          Password hashing pepper (required, at least 16 chars)
  EMAIL_PROVIDER           log | resend  [default: log]
  RESEND_API_KEY           Required when EMAIL_PROVIDER=resend
  TRUST_PROXY_HEADERS      Key the IP gate on X-Forwarded-For  [default: false]
  RUST_LOG                 Log filter  [default: info,sqlx=warn,hyper=warn]
  (See .env.example for all configuration options)
"
    )
}

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{}", help());
        return Ok(());
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        migrate: pargs.contains("--migrate"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    config.validate()?;
    info!(
        bind = %config.bind,
        email_provider = ?config.email.provider,
        blacklist_enabled = config.security.blacklist_enabled,
        trust_proxy_headers = config.trust_proxy_headers,
        "Configuration loaded"
    );

    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected successfully");

    if args.migrate {
        db.migrate().await.context("Failed to apply migrations")?;
        info!("Migrations applied");
    }

    let notifier: Arc<dyn Notifier> = match config.resend_config() {
        Some(resend) => {
            info!(from = %resend.from, "Sending email through Resend");
            Arc::new(ResendNotifier::new(resend))
        }
        None => {
            warn!("EMAIL_PROVIDER=log: emails are written to the log, not sent");
            Arc::new(LogNotifier)
        }
    };
    let (notifications, notification_worker) = NotificationQueue::start(notifier);

    let ip_limiter: Arc<dyn RateLimit> =
        Arc::new(SlidingWindowLimiter::new(config.rate_limits.ip));
    let email_limiter: Arc<dyn RateLimit> =
        Arc::new(SlidingWindowLimiter::new(config.rate_limits.email));

    let tokens = Arc::new(TokenService::new(db.pool().clone(), &config.token_config()));
    let auth = AuthService::new(
        db.pool().clone(),
        tokens,
        Arc::new(Argon2Hasher::new(config.security.password_pepper.clone())),
        email_limiter.clone(),
        notifications,
        config.auth_config(),
    );

    let sweeper = Sweeper::start(
        db.pool().clone(),
        config.sweep,
        vec![ip_limiter.clone(), email_limiter],
    );

    let state = AppState {
        auth,
        db: db.clone(),
        ip_limiter,
        trust_proxy_headers: config.trust_proxy_headers,
    };
    let app = api::create_router(state, api::cors_layer(&config.cors_allowed_origins));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down server...");
    sweeper.shutdown().await;

    // The router held the last queue handle; the worker drains and exits.
    match tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, notification_worker).await {
        Ok(Ok(())) => info!("Notification queue drained"),
        Ok(Err(e)) => warn!(error = %e, "Notification worker ended abnormally"),
        Err(_) => warn!("Timed out draining notification queue"),
    }

    db.close().await;
    Ok(())
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
