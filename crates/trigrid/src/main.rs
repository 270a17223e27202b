//! Trigrid server binary.

use trigrid::{Config, TrigridServerBuilder};
use trigrid_session::AcceptClaims;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(addr = %config.socket_addr_string(), "starting trigrid server");

    let server = TrigridServerBuilder::new()
        .config(&config)
        .build(AcceptClaims)
        .await?;

    server.run().await?;
    Ok(())
}
