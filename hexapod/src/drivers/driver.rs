use std::collections::VecDeque;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::LengthDriverConfig;
use crate::angles::Orientation;
use crate::calibration::LengthSource;
use crate::errors::AcquisitionError;
use crate::protocol::{extract_lines, Request, ACK};

/// Connection to a strut-length device behind a serial-to-TCP bridge (or the
/// simulator).
///
/// The stream is owned by the driver and closed when the driver is dropped.
/// A timed-out request leaves its reply unaccounted for, so the driver shuts
/// the stream down and every later request fails with
/// [`AcquisitionError::Disconnected`] until the caller reconnects.
#[derive(Debug)]
pub struct LengthDriver {
    pub config: LengthDriverConfig,
    stream: TcpStream,
    pending: Vec<u8>,
    lines: VecDeque<String>,
    desynced: bool,
}

impl LengthDriver {
    pub async fn connect(config: LengthDriverConfig) -> Result<LengthDriver, AcquisitionError> {
        config.validate().map_err(AcquisitionError::Unreachable)?;
        let addr = config.connection_url();
        let stream = connect_with_retries(
            &addr,
            config.connect_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
        .await?;
        info!("Connected to length device at {}", addr);

        Ok(Self {
            config,
            stream,
            pending: Vec::new(),
            lines: VecDeque::new(),
            desynced: false,
        })
    }

    /// Opens a connection, takes one reading and closes the connection again,
    /// whatever the outcome of the read.
    pub async fn acquire_once(config: LengthDriverConfig) -> Result<String, AcquisitionError> {
        let mut driver = Self::connect(config).await?;
        let reply = driver.command(&Request::Read).await;
        driver.disconnect().await;
        reply
    }

    /// Sends one request and waits for the reply line.
    pub async fn command(&mut self, request: &Request) -> Result<String, AcquisitionError> {
        if self.desynced {
            return Err(AcquisitionError::Disconnected);
        }

        let line = request.to_line();
        self.stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| AcquisitionError::FailedToSend(e.to_string()))?;
        debug!("Sent: {}", line.trim_end());

        let wait = self.config.timeout_ms;
        let waited = timeout(Duration::from_millis(wait), self.next_line()).await;
        let reply = match waited {
            Ok(reply) => reply?,
            Err(_) => {
                self.desync().await;
                return Err(AcquisitionError::Timeout(wait));
            }
        };
        debug!("Received: {}", reply);
        Ok(reply)
    }

    /// Moves a simulated platform. Real hardware answers `ERR`.
    pub async fn set_pose(&mut self, orientation: &Orientation) -> Result<(), AcquisitionError> {
        let reply = self.command(&Request::SetPose(*orientation)).await?;
        if reply.trim() == ACK {
            Ok(())
        } else {
            Err(AcquisitionError::Rejected(reply))
        }
    }

    pub async fn disconnect(mut self) {
        if self.desynced {
            return;
        }
        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown of length device stream failed: {}", e);
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.desynced
    }

    async fn desync(&mut self) {
        warn!("No reply within {} ms, closing the length device connection", self.config.timeout_ms);
        self.desynced = true;
        self.pending.clear();
        self.lines.clear();
        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown of length device stream failed: {}", e);
        }
    }

    async fn next_line(&mut self) -> Result<String, AcquisitionError> {
        let mut buf = [0u8; 256];
        loop {
            if let Some(line) = self.lines.pop_front() {
                return Ok(line);
            }
            let n = self
                .stream
                .read(&mut buf)
                .await
                .map_err(|e| AcquisitionError::FailedToReceive(e.to_string()))?;
            if n == 0 {
                return Err(AcquisitionError::Disconnected);
            }
            self.pending.extend_from_slice(&buf[..n]);
            self.lines.extend(extract_lines(&mut self.pending));
        }
    }
}

impl LengthSource for LengthDriver {
    async fn read_raw(&mut self) -> Result<String, AcquisitionError> {
        self.command(&Request::Read).await
    }
}

async fn connect_with_retries(addr: &str, retries: u32, delay: Duration) -> Result<TcpStream, AcquisitionError> {
    let mut last_error = String::new();
    for attempt in 0..retries {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                warn!("Failed to connect to {} (attempt {}): {}", addr, attempt + 1, e);
                last_error = e.to_string();
                if attempt + 1 < retries {
                    sleep(delay).await;
                }
            }
        }
    }
    Err(AcquisitionError::Unreachable(format!("{}: {}", addr, last_error)))
}
