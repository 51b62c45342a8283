use clap::Parser;
use pinmap_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pinmap_cli::logging::init();
    Cli::parse().run().await
}
