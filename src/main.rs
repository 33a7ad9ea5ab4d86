use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use bookstore_web::config::AppConfig;
use bookstore_web::infrastructure::logging::init_logger;
use bookstore_web::interface::api::start_server;
use bookstore_web::VERSION;

/// Bookstore database web front end
#[derive(Debug, Parser)]
#[command(name = "bookstore-web", version)]
struct Cli {
    /// 設定ファイル（省略時は ./bookstore.toml があれば読み込む）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 待ち受けポート（設定ファイルより優先）
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?.with_port(cli.port)?;

    init_logger(&config.logging);
    info!("bookstore-web version: {}", VERSION);

    start_server(config).await?;
    Ok(())
}
