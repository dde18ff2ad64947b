use std::error::Error;
use std::sync::Arc;

use hexapod::protocol::extract_lines;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::device::SimulatedPlatform;

/// Accepts clients forever, each handled in its own task against the shared
/// device state.
pub async fn serve(listener: TcpListener, state: Arc<Mutex<SimulatedPlatform>>) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Ok(addr) = listener.local_addr() {
        info!("Simulated length device listening on {}", addr);
    }

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        debug!("Client connected from {}", addr);

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, state).await {
                warn!("Error handling client {}: {:?}", addr, e);
            }
        });
    }
}

async fn handle_client(
    mut socket: TcpStream,
    state: Arc<Mutex<SimulatedPlatform>>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut buffer = vec![0; 1024];
    let mut pending = Vec::new();

    loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buffer[..n]);

        for line in extract_lines(&mut pending) {
            let response = state.lock().await.handle(&line);
            if let Some(response) = response {
                socket.write_all(response.as_bytes()).await?;
            }
        }
    }

    Ok(())
}
