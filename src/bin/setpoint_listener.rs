//! Standalone listener for setpoint-change datagrams.
//!
//! Binds the configured event address and prints every decoded event until
//! interrupted. Useful to watch a running controller from another terminal.

use anyhow::Result;
use tokio::net::UdpSocket;
use tracing::{info, warn};

use grid_congestion_controller::config::Config;
use grid_congestion_controller::events::SetpointChange;
use grid_congestion_controller::telemetry::{init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;
    let addr = format!("{}:{}", cfg.events.host, cfg.events.port);
    let socket = UdpSocket::bind(&addr).await?;
    info!(%addr, "setpoint listener active");

    let mut buf = vec![0u8; 64 * 1024];
    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, remote) = received?;
                match serde_json::from_slice::<SetpointChange>(&buf[..len]) {
                    Ok(event) => println!(
                        "[{}] {remote} {}",
                        event.emitted_at.to_rfc3339(),
                        serde_json::to_string(&event)?
                    ),
                    Err(error) => warn!(%error, %remote, "invalid event received"),
                }
            }
            _ = shutdown_signal() => break,
        }
    }

    Ok(())
}
