//! Listen to a networked digital scale, keep its latest weight in memory and
//! append every report to a JSON lines file.

pub mod cache;
pub mod config;
pub mod extract;
pub mod reading;
pub mod simulator;
pub mod sink;
pub mod supervisor;

pub use cache::WeightCache;
pub use config::{Config, SupervisorConfig};
pub use extract::extract_weight;
pub use reading::Reading;
pub use sink::{Sink, SinkConfig};
pub use supervisor::{Connector, Supervisor, TcpConnector};
