use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use project_tracker::cli::{self, output, Cli};
use project_tracker::config::API_KEY_ENV;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let env_api_key = std::env::var(API_KEY_ENV).ok();

    if let Err(e) = cli::run(cli, env_api_key).await {
        output::failure(format!("{e:#}"));
        std::process::exit(1);
    }
}
