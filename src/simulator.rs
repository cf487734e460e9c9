//! A stand-in for the scale: a TCP server that keeps sending `RTW:` reports
//! to every client that connects.

use std::{io, net::SocketAddr, time::Duration};

use anyhow::ensure;
use log::{debug, info, warn};
use rand::Rng;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    time::{interval, sleep},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub weight: f64,
    pub interval: Duration,
    /// Largest random deviation added to `weight`, in either direction.
    pub jitter: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            weight: 0.550,
            interval: Duration::from_millis(500),
            jitter: 0.0,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.weight.is_finite() && self.weight >= 0.0,
            "weight must be a non-negative number"
        );
        ensure!(
            self.jitter.is_finite() && self.jitter >= 0.0,
            "jitter must be a non-negative number"
        );
        ensure!(!self.interval.is_zero(), "interval must be greater than 0");
        Ok(())
    }

    fn sample(&self) -> f64 {
        if self.jitter > 0.0 {
            let offset = rand::thread_rng().gen_range(-self.jitter..=self.jitter);
            (self.weight + offset).max(0.0)
        } else {
            self.weight
        }
    }
}

pub fn format_message(weight: f64) -> String {
    format!("RTW:{:.3} kg", weight)
}

/// Accept clients on `listener` until `token` is cancelled.
pub async fn serve(
    listener: TcpListener,
    config: SimulatorConfig,
    token: CancellationToken,
) -> io::Result<()> {
    config
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    info!("scale simulator listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = tokio::select! {
            _ = token.cancelled() => break,
            r = listener.accept() => match r {
                Ok(accepted) => accepted,
                Err(e) => {
                    // e.g. out of file descriptors; pause so the loop does not spin
                    warn!("failed to accept client: {}", e);
                    sleep(Duration::from_millis(100)).await;
                    continue;
                }
            },
        };
        info!("client {} connected", peer);
        tokio::spawn(feed_client(stream, peer, config.clone(), token.child_token()));
    }
    info!("scale simulator stopped");
    Ok(())
}

async fn feed_client(
    mut stream: TcpStream,
    peer: SocketAddr,
    config: SimulatorConfig,
    token: CancellationToken,
) {
    let mut ticker = interval(config.interval);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let message = format_message(config.sample());
        if let Err(e) = stream.write_all(message.as_bytes()).await {
            warn!("client {} dropped: {}", peer, e);
            return;
        }
        debug!("sent {:?} to {}", message, peer);
    }
    info!("disconnecting client {}", peer);
}
