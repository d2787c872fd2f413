use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use calgrid_core::remote::memory::MemoryGateway;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 5000;

#[derive(Parser)]
#[command(name = "calgrid-server")]
#[command(about = "In-memory events service for trying calgrid locally")]
struct Cli {
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let app = calgrid_server::router(Arc::new(MemoryGateway::new()));

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("calgrid-server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
