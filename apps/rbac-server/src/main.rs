mod config;
mod error;
mod handlers;
mod schema;
mod server;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rbac_storage::Store;
use rbac_store_sqlite::SqliteStore;
use tracing_subscriber::EnvFilter;

use config::{LogFormat, RawConfig, ServerConfig};
use schema::UserWrite;
use server::{app, RbacServer, ReadinessCheck};

// ────────────────────────────────────── CLI Types ──────────────────────────────────────

#[derive(Parser)]
#[command(name = "rbac-server")]
#[command(about = "RBAC administration server: users, groups, permissions and projects")]
struct Cli {
    /// Database URL (sqlite://path/to/db.db) or a path to a SQLite file [env: DATABASE_URL]
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Maximum pooled database connections [env: RBAC_DB_MAX_CONNECTIONS]
    #[arg(long, global = true)]
    max_connections: Option<String>,

    /// Log output format: text or json [env: RBAC_LOG_FORMAT]
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Listen address [env: RBAC_ADDR]
        #[arg(long)]
        addr: Option<String>,
    },
    /// User administration commands
    User {
        #[command(subcommand)]
        user_cmd: UserCommand,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create a user account (for bootstrapping an administrator)
    Create {
        username: String,
        /// Plaintext password; hashed before it is stored
        #[arg(long, env = "RBAC_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Mark the account as staff
        #[arg(long)]
        staff: bool,
        /// Mark the account as superuser
        #[arg(long)]
        superuser: bool,
    },
}

// ────────────────────────────────────── Commands ──────────────────────────────────────

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn open_store(config: &ServerConfig) -> Result<Arc<SqliteStore>, Box<dyn std::error::Error>> {
    let store = SqliteStore::open(&config.database_url, config.max_connections).await?;
    Ok(Arc::new(store))
}

async fn cmd_serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config).await?;
    let server = RbacServer::new(store);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    let local_addr = listener.local_addr()?;

    let (readiness_tx, readiness_rx) = tokio::sync::watch::channel(true);
    let router = app(server, ReadinessCheck::new(readiness_rx));

    tracing::info!(addr = %local_addr, "rbac-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(readiness_tx))
        .await?;

    tracing::info!("rbac-server stopped");
    Ok(())
}

async fn cmd_user_create(
    config: ServerConfig,
    write: UserWrite,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut params, password) = write.validate_create()?;
    params.password_hash = rbac_crypto::hash_password(&password)?;

    let store = open_store(&config).await?;
    let user_id = store.create_user(&params).await?;

    println!("✓ User '{}' created (id {})", params.username, user_id);
    Ok(())
}

async fn shutdown_signal(readiness_tx: tokio::sync::watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down gracefully"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down gracefully"),
    }

    // Mark not ready on shutdown for clean traffic drain
    let _ = readiness_tx.send(false);
}

// ────────────────────────────────────── Main ──────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let addr = match &cli.command {
        Command::Serve { addr } => addr.clone(),
        Command::User { .. } => None,
    };
    // Flags win over the environment.
    let env = RawConfig::from_env();
    let config = ServerConfig::resolve(RawConfig {
        database_url: cli.database_url.or(env.database_url),
        addr: addr.or(env.addr),
        max_connections: cli.max_connections.or(env.max_connections),
        log_format: cli.log_format.or(env.log_format),
    })?;

    init_tracing(config.log_format);

    match cli.command {
        Command::Serve { .. } => cmd_serve(config).await?,
        Command::User { user_cmd } => match user_cmd {
            UserCommand::Create {
                username,
                password,
                email,
                staff,
                superuser,
            } => {
                let write = UserWrite {
                    username: Some(username),
                    password: Some(password),
                    email: Some(email),
                    is_staff: Some(staff),
                    is_superuser: Some(superuser),
                    ..Default::default()
                };
                cmd_user_create(config, write).await?;
            }
        },
    }

    Ok(())
}
