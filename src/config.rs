use std::{
    fs::File,
    io::{self, BufReader},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    time::Duration,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::sink::SinkConfig;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read config file `{1}`: {0}")]
    Io(io::Error, String),
    #[error("failed to parse config file `{1}`: {0}")]
    Parse(serde_yaml::Error, String),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[inline]
fn default_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(192, 168, 0, 55))
}
#[inline]
fn default_port() -> u16 {
    4321
}
#[inline]
fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}
#[inline]
fn default_retry_interval() -> Duration {
    Duration::from_secs(5)
}
#[inline]
fn default_chunk_size() -> usize {
    1024
}
#[inline]
fn default_unit() -> String {
    "kg".to_string()
}
#[inline]
fn default_status_interval() -> Duration {
    Duration::from_secs(60)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    // IP address of the scale
    // optional, default: 192.168.0.55
    #[serde(default = "default_address")]
    pub address: IpAddr,
    // TCP port the scale listens on
    // optional, default: 4321
    #[serde(default = "default_port")]
    pub port: u16,
    // Upper bound for a single connection attempt
    // optional, default: 5s
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
    // Pause between a failure and the next connection attempt
    // optional, default: 5s
    #[serde(default = "default_retry_interval", with = "humantime_serde")]
    pub retry_interval: Duration,
    // Maximum number of bytes taken from the socket per read
    // optional, default: 1024
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    // Unit label stamped on every reading
    // optional, default: kg
    #[serde(default = "default_unit")]
    pub unit: String,
    // How often the latest reading is reported in the log
    // optional, default: 60s
    #[serde(default = "default_status_interval", with = "humantime_serde")]
    pub status_interval: Duration,
    // Where readings are persisted
    // optional, default: File { path: data/scale_data.json }
    #[serde(default)]
    pub sink: SinkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            connect_timeout: default_connect_timeout(),
            retry_interval: default_retry_interval(),
            chunk_size: default_chunk_size(),
            unit: default_unit(),
            status_interval: default_status_interval(),
            sink: SinkConfig::default(),
        }
    }
}

/// The part of [`Config`] the supervisor needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorConfig {
    pub endpoint: SocketAddr,
    pub connect_timeout: Duration,
    pub retry_interval: Duration,
    pub chunk_size: usize,
    pub unit: String,
}

impl Config {
    /// Load the YAML config at `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("config file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e, path.display().to_string())),
        };
        let config: Self = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|e| Error::Parse(e, path.display().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.chunk_size == 0 {
            return Err(Error::Invalid("chunk_size must be greater than 0"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::Invalid("connect_timeout must be greater than 0"));
        }
        if self.retry_interval.is_zero() {
            return Err(Error::Invalid("retry_interval must be greater than 0"));
        }
        if self.status_interval.is_zero() {
            return Err(Error::Invalid("status_interval must be greater than 0"));
        }
        Ok(())
    }

    pub fn supervisor(&self) -> SupervisorConfig {
        SupervisorConfig {
            endpoint: SocketAddr::new(self.address, self.port),
            connect_timeout: self.connect_timeout,
            retry_interval: self.retry_interval,
            chunk_size: self.chunk_size,
            unit: self.unit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use tempfile::TempDir;

    use super::*;
    use crate::sink::FileConfig;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.supervisor().endpoint,
            "192.168.0.55:4321".parse().unwrap()
        );
    }

    #[test]
    fn parses_all_keys() {
        let config: Config = serde_yaml::from_str(indoc!(
            "
            address: 127.0.0.1
            port: 9000
            connect_timeout: 2s
            retry_interval: 500ms
            chunk_size: 256
            unit: lb
            status_interval: 10s
            sink:
              File:
                path: /var/lib/scale/readings.json
            "
        ))
        .unwrap();

        let supervisor = config.supervisor();
        assert_eq!(supervisor.endpoint, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(supervisor.connect_timeout, Duration::from_secs(2));
        assert_eq!(supervisor.retry_interval, Duration::from_millis(500));
        assert_eq!(supervisor.chunk_size, 256);
        assert_eq!(supervisor.unit, "lb");
        assert_eq!(
            config.sink,
            SinkConfig::File(FileConfig {
                path: "/var/lib/scale/readings.json".into()
            })
        );
    }

    #[test]
    fn console_sink() {
        let config: Config = serde_yaml::from_str("sink: Console").unwrap();
        assert_eq!(config.sink, SinkConfig::Console);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "chunk_size: 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Invalid(_))));
    }

    #[test]
    fn rejects_zero_durations() {
        for key in ["connect_timeout", "retry_interval", "status_interval"] {
            let config: Config = serde_yaml::from_str(&format!("{}: 0s", key)).unwrap();
            assert!(
                matches!(config.validate(), Err(Error::Invalid(_))),
                "{} of 0s accepted",
                key
            );
        }
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn reports_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "port: [not, a, port]\n").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::Parse(..))));
    }
}
