use async_trait::async_trait;
use common::models::TradeSignal;

use crate::error::FetchError;

/// Anything that can hand the poller the backend's current signal list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn fetch_signals(&self) -> Result<Vec<TradeSignal>, FetchError>;
}
