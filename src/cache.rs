use tokio::sync::watch;

use crate::reading::Reading;

/// Single-slot store for the most recent [`Reading`].
///
/// Readers never block the writer: `update` swaps the slot and `current`
/// clones whatever is in it at that moment.
#[derive(Debug)]
pub struct WeightCache {
    slot: watch::Sender<Option<Reading>>,
}

impl WeightCache {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    pub fn update(&self, reading: Reading) {
        self.slot.send_replace(Some(reading));
    }

    /// `None` until the first reading arrives.
    pub fn current(&self) -> Option<Reading> {
        self.slot.borrow().clone()
    }

    /// Receiver that is notified on every update.
    pub fn subscribe(&self) -> watch::Receiver<Option<Reading>> {
        self.slot.subscribe()
    }
}

impl Default for WeightCache {
    fn default() -> Self {
        Self::new()
    }
}
