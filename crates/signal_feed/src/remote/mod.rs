pub mod dashboard_client;
pub mod proxy;

pub use dashboard_client::DashboardClient;
pub use proxy::ProxyRule;
