use clap::Parser;
use tracing_subscriber::EnvFilter;

use authgate::cli::Cli;
use authgate::config::ConfigError;

#[tokio::main]
async fn main() {
    // Load .env if present; `${VAR}` references are expanded by dotenvy
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("authgate=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = authgate::cli::run(cli).await {
        match e.downcast_ref::<ConfigError>() {
            Some(config) => {
                eprintln!("\n❌ Invalid environment variables:");
                for issue in &config.issues {
                    eprintln!("- {}", issue);
                }
                eprintln!();
            }
            None => eprintln!("Error: {e:?}"),
        }
        std::process::exit(1);
    }
}
