use anyhow::Result;
use arena::Server;
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::{self, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let server = Server::new();
    let service = server.clone().serve(stdio()).await?;
    service.waiting().await?;

    server.shutdown().await;
    Ok(())
}
