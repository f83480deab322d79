use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::app::{self, AppState};
use crate::auth::PgSessionStore;
use crate::config::Env;
use crate::database::Database;

#[derive(Parser)]
#[command(name = "authgate")]
#[command(about = "Session-gated web application server")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve,

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "AUTHGATE_HOST", default_value = "0.0.0.0", help = "Address to bind")]
    pub host: IpAddr,

    #[arg(long, env = "AUTHGATE_PORT", default_value_t = 3000, help = "Port to listen on")]
    pub port: u16,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    // Invalid configuration never reaches the listener
    let env = Arc::new(Env::from_env()?);
    info!("Starting authgate in {:?} mode", env.environment);

    let db = Database::connect_lazy(&env)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => {
            db.migrate().await?;
            Ok(())
        }
        Commands::Serve => serve(cli.serve, env, db).await,
    }
}

async fn serve(args: ServeArgs, env: Arc<Env>, db: Database) -> anyhow::Result<()> {
    let provider = Arc::new(PgSessionStore::new(db.clone(), env.session_cookie_name.clone()));
    let app = app::router(AppState::new(env, db.clone(), provider));

    let addr = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(addr).await?;
    info!("authgate listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
