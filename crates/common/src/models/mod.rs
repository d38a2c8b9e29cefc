pub mod signal;

pub use signal::{SignalType, TradeSignal};
