use std::error::Error;
use std::sync::Arc;

use sim::{serve, SimConfig, SimulatedPlatform};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// Usage: `sim [config.json]`. Without a file the bench rig is served on the
/// default port.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_json(&std::fs::read_to_string(&path)?)?,
        None => SimConfig::default(),
    };

    let device = SimulatedPlatform::from_config(&config)?;
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    serve(listener, Arc::new(Mutex::new(device))).await
}
