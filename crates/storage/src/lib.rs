pub mod log_buffer;
pub mod signal_store;

pub use log_buffer::{LogBuffer, LogEntry};
pub use signal_store::{SignalStore, StoreSnapshot};
