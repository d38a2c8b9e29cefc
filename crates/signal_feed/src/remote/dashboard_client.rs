use std::time::Duration;

use async_trait::async_trait;
use common::{config::DashboardConfig, models::TradeSignal};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{
    error::{FetchError, ProxyError},
    remote::proxy::ProxyRule,
    traits::SignalSource,
};

const USER_AGENT: &str = "signal_dashboard/0.1.0";

/// Pulls the dashboard signal list over HTTP.
#[derive(Clone)]
pub struct DashboardClient {
    client: Client,
    endpoint: Url,
}

impl DashboardClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Resolves the configured signals path and builds a client for it.
    ///
    /// An absolute http(s) URL is used as is; anything else goes through the proxy rule.
    pub fn from_config(config: &DashboardConfig) -> anyhow::Result<Self> {
        let endpoint = resolve_endpoint(config)?;
        debug!("Signals endpoint resolved to {}", endpoint);
        Ok(Self::new(endpoint, config.request_timeout)?)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub fn resolve_endpoint(config: &DashboardConfig) -> Result<Url, ProxyError> {
    // `localhost:8000/x` parses with scheme "localhost"
    let absolute = Url::parse(&config.signals_path)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"));
    if let Some(url) = absolute {
        return Ok(url);
    }

    let rule = ProxyRule::new(&config.proxy_prefix, &config.upstream_url)?;
    rule.rewrite(&config.signals_path)
        .ok_or_else(|| ProxyError::Unrouted(config.signals_path.clone()))
}

#[async_trait]
impl SignalSource for DashboardClient {
    async fn fetch_signals(&self) -> Result<Vec<TradeSignal>, FetchError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let signals: Vec<TradeSignal> = serde_json::from_slice(&body)?;
        debug!("Fetched {} signals ({} bytes)", signals.len(), body.len());

        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::SignalType;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    /// Serves exactly one canned HTTP response and reports the request line.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (Url, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (request_tx, request_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let _ = request_tx.send(request.lines().next().unwrap_or_default().to_string());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        let url = Url::parse(&format!("http://{}/api/v1/signals/dashboard", addr)).unwrap();
        (url, request_rx)
    }

    fn client_for(endpoint: Url) -> DashboardClient {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        DashboardClient::with_client(client, endpoint)
    }

    #[tokio::test]
    async fn test_fetches_and_decodes_list() {
        let body = r#"[{"token":"ABC","signal":"SHORT","uis_score":80,"confidence":90,"expected_move_pct":-12,"reason":"whale exit"},{"token":"XYZ","signal":"LONG_AFTER_DUMP","uis_score":0.4,"confidence":65,"expected_move_pct":7.5,"reason":"small cliff"}]"#;
        let (url, request_rx) = serve_once("200 OK", body).await;

        let signals = client_for(url).fetch_signals().await.unwrap();

        assert_eq!(request_rx.await.unwrap(), "GET /api/v1/signals/dashboard HTTP/1.1");
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].token, "ABC");
        assert_eq!(signals[1].signal, SignalType::LongAfterDump);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (url, _request_rx) = serve_once("503 Service Unavailable", r#"{"detail":"down"}"#).await;

        let err = client_for(url).fetch_signals().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_decode_error() {
        let (url, _request_rx) = serve_once("200 OK", r#"{"signals":[]}"#).await;

        let err = client_for(url).fetch_signals().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/api/v1/signals/dashboard", addr)).unwrap();
        let err = client_for(url).fetch_signals().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)), "got {:?}", err);
    }

    #[test]
    fn test_endpoint_from_default_config() {
        let url = resolve_endpoint(&DashboardConfig::default()).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/api/v1/signals/dashboard");
    }

    #[test]
    fn test_absolute_signals_path_bypasses_proxy() {
        let config = DashboardConfig {
            signals_path: "http://10.0.0.7:8000/api/v1/signals/dashboard".to_string(),
            ..DashboardConfig::default()
        };
        let url = resolve_endpoint(&config).unwrap();
        assert_eq!(url.host_str(), Some("10.0.0.7"));
    }

    #[test]
    fn test_unrouted_path() {
        let config = DashboardConfig {
            signals_path: "/elsewhere/signals".to_string(),
            ..DashboardConfig::default()
        };
        assert!(matches!(
            resolve_endpoint(&config),
            Err(ProxyError::Unrouted(_))
        ));
    }

    #[test]
    fn test_schemeless_host_is_not_taken_as_absolute() {
        for signals_path in ["localhost:8000/api/v1/signals/dashboard", "ftp://10.0.0.7/signals"] {
            let config = DashboardConfig {
                signals_path: signals_path.to_string(),
                ..DashboardConfig::default()
            };
            match resolve_endpoint(&config) {
                Err(ProxyError::Unrouted(path)) => assert_eq!(path, signals_path),
                other => panic!("{} resolved to {:?}", signals_path, other),
            }
        }
    }
}
