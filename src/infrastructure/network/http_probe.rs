use crate::application::ports::{ConnectivityProbe, ProbeResponse};
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Issues a GET against a liveness URL. Any HTTP answer is a response; only
/// transport failures are errors.
pub struct HttpConnectivityProbe {
    client: Client,
    url: String,
}

impl HttpConnectivityProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::ConfigurationError(format!("Invalid HTTP client: {err}")))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn probe(&self) -> Result<ProbeResponse, AppError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(
                target: "offline::connectivity",
                url = %self.url,
                status = status.as_u16(),
                "liveness endpoint returned a non-success status"
            );
        }
        Ok(ProbeResponse {
            success: status.is_success(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response =
                format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}/health")
    }

    #[tokio::test]
    async fn test_success_status() {
        let url = serve_once("HTTP/1.1 204 No Content").await;
        let probe = HttpConnectivityProbe::new(url, Duration::from_secs(5)).unwrap();
        assert!(probe.probe().await.unwrap().success);
    }

    #[tokio::test]
    async fn test_error_status_is_unsuccessful_response() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable").await;
        let probe = HttpConnectivityProbe::new(url, Duration::from_secs(5)).unwrap();
        assert!(!probe.probe().await.unwrap().success);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe =
            HttpConnectivityProbe::new(format!("http://{addr}/"), Duration::from_secs(2)).unwrap();
        assert!(probe.probe().await.is_err());
    }
}
