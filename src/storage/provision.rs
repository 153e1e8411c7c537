use log::info;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("storage dispatcher request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage dispatcher responded with {0}")]
    Status(StatusCode),
}

/// Allocates a shared volume and returns its claim name
pub trait StorageProvisioner {
    async fn provision(&self, token: &str, storage_gib: u32) -> Result<String, ProvisionError>;
}

#[derive(Debug, Serialize)]
struct ProvisionRequest {
    storage_gib: u32,
}

#[derive(Debug, Deserialize)]
struct ProvisionResponse {
    name: String,
}

/// HTTP client for the nextflow dispatcher service running inside the cluster
pub struct Dispatcher {
    client: Client,
    url: Url,
}

impl Dispatcher {
    pub fn new(url: Url) -> Dispatcher {
        Dispatcher { client: Client::new(), url }
    }
}

impl StorageProvisioner for Dispatcher {
    /// One POST, no retries: any non-success status is fatal for the run
    async fn provision(&self, token: &str, storage_gib: u32) -> Result<String, ProvisionError> {
        info!("Provisioning shared storage volume ({storage_gib} GiB) from {}", self.url);
        let response = self
            .client
            .post(self.url.clone())
            .header(AUTHORIZATION, format!("Latch-Execution-Token {token}"))
            .json(&ProvisionRequest { storage_gib })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProvisionError::Status(status));
        }

        let body: ProvisionResponse = response.json().await?;
        info!("Provisioned volume {}", body.name);
        Ok(body.name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// What the dispatcher saw: request line, lowercased header names, body
    struct Received {
        request_line: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Received {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
        }
    }

    /// Answers exactly one request with a canned response
    async fn dispatcher_replying(status: &str, body: &'static str) -> (Dispatcher, JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}/provision-storage", listener.local_addr().unwrap())).unwrap();
        let status = status.to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            let received = loop {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before the request was complete");
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                let Some((head, payload)) = text.split_once("\r\n\r\n") else { continue };
                let mut lines = head.lines();
                let request_line = lines.next().unwrap().to_string();
                let headers: Vec<(String, String)> = lines
                    .filter_map(|line| line.split_once(':'))
                    .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                    .collect();
                let length: usize = headers
                    .iter()
                    .find(|(k, _)| k == "content-length")
                    .map(|(_, v)| v.parse().unwrap())
                    .unwrap_or(0);
                if payload.len() >= length {
                    break Received { request_line, headers, body: payload.to_string() };
                }
            };

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            received
        });

        // no proxies between the test and its listener
        let client = Client::builder().no_proxy().build().unwrap();
        (Dispatcher { client, url }, server)
    }

    #[tokio::test]
    async fn provision_posts_token_and_size() {
        let (dispatcher, server) = dispatcher_replying("200 OK", r#"{"name": "pvc-7f3a"}"#).await;

        let claim = dispatcher.provision("exec-token-123", 100).await.unwrap();
        assert_eq!(claim, "pvc-7f3a");

        let received = server.await.unwrap();
        assert_eq!(received.request_line, "POST /provision-storage HTTP/1.1");
        assert_eq!(received.header("authorization"), Some("Latch-Execution-Token exec-token-123"));
        assert_eq!(received.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(&received.body).unwrap();
        assert_eq!(body, json!({"storage_gib": 100}));
    }

    #[tokio::test]
    async fn non_success_status_is_fatal() {
        let (dispatcher, server) = dispatcher_replying("500 Internal Server Error", r#"{"error": "no capacity"}"#).await;

        let err = dispatcher.provision("exec-token-123", 100).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Status(status) if status == StatusCode::INTERNAL_SERVER_ERROR));
        server.await.unwrap();
    }

    #[test]
    fn request_body() {
        let body = serde_json::to_value(ProvisionRequest { storage_gib: 100 }).unwrap();
        assert_eq!(body, json!({"storage_gib": 100}));
    }

    #[test]
    fn response_body_ignores_extra_fields() {
        let body: ProvisionResponse = serde_json::from_value(json!({"name": "pvc-7f3a", "size": "100Gi"})).unwrap();
        assert_eq!(body.name, "pvc-7f3a");
    }

    #[test]
    fn status_error_message() {
        let err = ProvisionError::Status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "storage dispatcher responded with 500 Internal Server Error");
    }
}
