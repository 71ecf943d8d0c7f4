use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "shortscribe")]
#[command(version)]
#[command(about = "Telegram webhook that shortens links and transcribes voice notes")]
struct Cli {
    /// Path to the TOML config file (missing file means defaults)
    #[arg(long, env = "SHORTSCRIBE_CONFIG", default_value = shortscribe::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Address to listen on, overrides server.listen
    #[arg(long, value_name = "ADDR")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shortscribe=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = shortscribe::run(&cli.config, cli.listen).await {
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}
