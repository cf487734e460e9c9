use async_trait::async_trait;

use super::Sink;
use crate::reading::Reading;

pub struct ConsoleSink;

#[async_trait]
impl Sink for ConsoleSink {
    async fn update(&self, reading: &Reading) -> anyhow::Result<()> {
        match reading.weight {
            Some(weight) => println!(
                "[reading] {}: {} {} ({:?})",
                reading.timestamp, weight, reading.unit, reading.raw_message
            ),
            None => println!(
                "[reading] {}: no weight ({:?})",
                reading.timestamp, reading.raw_message
            ),
        }
        Ok(())
    }
}
