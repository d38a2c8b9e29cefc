use common::{config::DEFAULT_SIGNAL_CAPACITY, models::TradeSignal};
use tokio::sync::watch;
use tracing::debug;

/// Everything a render surface needs to draw the signal feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub signals: Vec<TradeSignal>,
    /// "Polling is active", not "the last fetch succeeded".
    pub is_connected: bool,
}

/// Observable holder of the current [`StoreSnapshot`].
///
/// Each mutation publishes one whole snapshot to subscribers, so a reader
/// never sees a half-applied update.
pub struct SignalStore {
    tx: watch::Sender<StoreSnapshot>,
    capacity: usize,
}

impl SignalStore {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = watch::channel(StoreSnapshot::default());
        Self {
            tx,
            capacity: capacity.max(1),
        }
    }

    /// Replaces the whole list, keeping the backend's order.
    pub fn set_signals(&self, signals: Vec<TradeSignal>) {
        debug!("Replacing signal list with {} entries", signals.len());
        self.tx.send_modify(|snapshot| snapshot.signals = signals);
    }

    /// Puts `signal` at the front and drops whatever falls past the capacity.
    pub fn add_signal(&self, signal: TradeSignal) {
        let capacity = self.capacity;
        self.tx.send_modify(|snapshot| {
            snapshot.signals.insert(0, signal);
            snapshot.signals.truncate(capacity);
        });
    }

    pub fn set_connected(&self, connected: bool) {
        self.tx
            .send_modify(|snapshot| snapshot.is_connected = connected);
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.tx.borrow().clone()
    }

    pub fn signals(&self) -> Vec<TradeSignal> {
        self.tx.borrow().signals.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.tx.borrow().is_connected
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNAL_CAPACITY)
    }
}
