mod console;
mod file;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::reading::Reading;

pub use console::ConsoleSink;
pub use file::{Config as FileConfig, FileSink};

/// Durable destination for every reading, in the order they were received.
///
/// Implementations must tolerate concurrent callers.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn update(&self, reading: &Reading) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum SinkConfig {
    Console,
    File(file::Config),
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::File(file::Config::default())
    }
}

impl SinkConfig {
    pub async fn into_sink(self) -> anyhow::Result<Arc<dyn Sink>> {
        match self {
            SinkConfig::Console => Ok(Arc::new(console::ConsoleSink)),
            SinkConfig::File(config) => Ok(Arc::new(
                file::FileSink::new(config)
                    .await
                    .context("failed to create file sink")?,
            )),
        }
    }
}
