use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

use super::Sink;
use crate::reading::Reading;

#[inline]
fn default_path() -> PathBuf {
    PathBuf::from("data/scale_data.json")
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // Path of the JSON lines file readings are appended to
    // optional, default: data/scale_data.json
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

/// Appends one JSON object per line to a file that only ever grows.
pub struct FileSink {
    path: PathBuf,
    // Held for the whole open-write-flush sequence of a record.
    write_lock: Mutex<()>,
}

impl FileSink {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        ensure_parent(&config.path).await?;
        Ok(Self {
            path: config.path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display())),
        _ => Ok(()),
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn update(&self, reading: &Reading) -> anyhow::Result<()> {
        // serde_json never emits raw newlines, so a record is always one line
        let mut line = serde_json::to_string(reading).context("failed to serialize reading")?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        ensure_parent(&self.path).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open file {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .with_context(|| format!("failed to append to file {}", self.path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("failed to flush file {}", self.path.display()))?;
        debug!("appended reading to {}", self.path.display());
        Ok(())
    }
}
