use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use chrono::Local;
use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    net::TcpStream,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

use crate::{
    cache::WeightCache, config::SupervisorConfig, extract::extract_weight, reading::Reading,
    sink::Sink,
};

/// Opens the byte stream the scale reports on.
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + Unpin + Send;

    async fn connect(&self) -> io::Result<Self::Stream>;
}

pub struct TcpConnector {
    endpoint: SocketAddr,
}

impl TcpConnector {
    pub fn new(endpoint: SocketAddr) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> io::Result<TcpStream> {
        TcpStream::connect(self.endpoint).await
    }
}

#[derive(Debug)]
pub enum ConnectOutcome<S> {
    Connected(S),
    TimedOut,
    Failed(io::Error),
    Cancelled,
}

/// Why a connected session stopped reading.
#[derive(Debug)]
pub enum SessionEnd {
    Closed,
    Failed(io::Error),
    Cancelled,
}

/// Keeps a connection to the scale alive and feeds every message it sends
/// into the cache and the sink.
pub struct Supervisor<C: Connector> {
    config: SupervisorConfig,
    connector: C,
    cache: Arc<WeightCache>,
    sink: Arc<dyn Sink>,
}

impl Supervisor<TcpConnector> {
    pub fn tcp(config: SupervisorConfig, cache: Arc<WeightCache>, sink: Arc<dyn Sink>) -> Self {
        let connector = TcpConnector::new(config.endpoint);
        Self::new(config, connector, cache, sink)
    }
}

impl<C: Connector> Supervisor<C> {
    pub fn new(
        config: SupervisorConfig,
        connector: C,
        cache: Arc<WeightCache>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            config,
            connector,
            cache,
            sink,
        }
    }

    /// Connect, read, and reconnect until `token` is cancelled.
    pub async fn run(self, token: CancellationToken) {
        let endpoint = self.config.endpoint;
        while !token.is_cancelled() {
            info!("connecting to scale at {}", endpoint);
            match self.connect(&token).await {
                ConnectOutcome::Connected(stream) => {
                    info!("connected to scale at {}", endpoint);
                    match self.session(stream, &token).await {
                        SessionEnd::Closed => warn!("connection closed by scale at {}", endpoint),
                        SessionEnd::Failed(e) => {
                            error!("connection to scale at {} error: {}", endpoint, e)
                        }
                        SessionEnd::Cancelled => break,
                    }
                }
                ConnectOutcome::TimedOut => warn!(
                    "connecting to scale at {} timed out after {:?}",
                    endpoint, self.config.connect_timeout
                ),
                ConnectOutcome::Failed(e) => {
                    warn!("failed to connect to scale at {}: {}", endpoint, e)
                }
                ConnectOutcome::Cancelled => break,
            }

            info!("retrying in {:?}", self.config.retry_interval);
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = sleep(self.config.retry_interval) => {}
            }
        }
        info!("stopped listening to scale at {}", endpoint);
    }

    async fn connect(&self, token: &CancellationToken) -> ConnectOutcome<C::Stream> {
        tokio::select! {
            biased;
            _ = token.cancelled() => ConnectOutcome::Cancelled,
            r = timeout(self.config.connect_timeout, self.connector.connect()) => match r {
                Ok(Ok(stream)) => ConnectOutcome::Connected(stream),
                Ok(Err(e)) => ConnectOutcome::Failed(e),
                Err(_) => ConnectOutcome::TimedOut,
            },
        }
    }

    // The stream is dropped, and with it the socket closed, on every return.
    async fn session(&self, mut stream: C::Stream, token: &CancellationToken) -> SessionEnd {
        let mut buffer = vec![0u8; self.config.chunk_size];
        loop {
            let len = tokio::select! {
                biased;
                _ = token.cancelled() => return SessionEnd::Cancelled,
                r = stream.read(&mut buffer) => match r {
                    Ok(0) => return SessionEnd::Closed,
                    Ok(len) => len,
                    Err(e) => return SessionEnd::Failed(e),
                },
            };
            debug!("received {} bytes: {:x?}", len, &buffer[..len]);
            self.publish(&buffer[..len]).await;
        }
    }

    /// Turn one received chunk into a [`Reading`] and hand it to both sinks.
    /// Blank chunks are dropped and yield `None`.
    pub(crate) async fn publish(&self, chunk: &[u8]) -> Option<Reading> {
        let text = decode_ascii(chunk);
        let message = text.trim();
        if message.is_empty() {
            return None;
        }
        info!("received message {:?}", message);

        let weight = extract_weight(message);
        if weight.is_none() {
            warn!("could not extract weight from message {:?}", message);
        }
        let reading = Reading {
            timestamp: Local::now(),
            raw_message: message.to_string(),
            weight,
            unit: self.config.unit.clone(),
        };

        self.cache.update(reading.clone());
        if let Err(e) = self.sink.update(&reading).await {
            error!("failed to persist reading {:?}: {:#}", message, e);
        }
        if let Some(weight) = weight {
            info!("extracted weight: {} {}", weight, reading.unit);
        }
        Some(reading)
    }
}

// Bytes outside the ASCII range become `?`.
fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}
