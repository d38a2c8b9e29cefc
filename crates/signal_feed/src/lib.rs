pub mod error;
pub mod remote;
pub mod services;
pub mod traits;

pub use error::{FetchError, ProxyError};
pub use remote::{DashboardClient, ProxyRule};
pub use services::signal_poller::{PollOutcome, PollerHandle, SignalPoller};
pub use traits::SignalSource;
