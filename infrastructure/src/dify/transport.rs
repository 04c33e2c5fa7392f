//! HTTP transport for streaming chat messages

use super::error::DifyError;
use super::protocol::ChatMessageRequest;
use crate::config::TargetSettings;
use async_trait::async_trait;
use futures::StreamExt;
use relay_application::{StreamTransport, TransportError, TransportResponse};
use relay_domain::StreamRequest;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`StreamTransport`] over `reqwest`.
///
/// No overall request timeout is set: the body of a streaming response
/// stays open for as long as upstream keeps talking, and the idle deadline
/// is enforced by the request registry. Dropping the returned body closes
/// the connection.
pub struct DifyTransport {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl DifyTransport {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Result<Self, DifyError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Self::with_client(client, api_base, api_key)
    }

    /// Use a caller-configured client (proxies, TLS roots, ...).
    pub fn with_client(
        client: Client,
        api_base: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, DifyError> {
        let api_base = api_base.into().trim().trim_end_matches('/').to_string();
        if api_base.is_empty() {
            return Err(DifyError::EmptyApiBase);
        }
        Ok(Self {
            client,
            api_base,
            api_key,
        })
    }

    pub fn from_target(target: &TargetSettings) -> Result<Self, DifyError> {
        Self::new(target.api_base.clone(), target.api_key.clone())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat-messages", self.api_base)
    }
}

#[async_trait]
impl StreamTransport for DifyTransport {
    async fn open(&self, request: &StreamRequest) -> Result<TransportResponse, TransportError> {
        let body = ChatMessageRequest::from(request);
        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Accept", "text/event-stream")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        debug!("Dify: {} answered {}", self.endpoint(), status);

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::Stream(e.to_string()))
            })
            .boxed();
        Ok(TransportResponse::new(status, body))
    }

    fn describe(&self) -> String {
        self.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the raw request text.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/v1", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&received).into_owned()
        });
        (base, server)
    }

    fn local(base: String, api_key: Option<String>) -> DifyTransport {
        let client = Client::builder().no_proxy().build().unwrap();
        DifyTransport::with_client(client, base, api_key).unwrap()
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        received.len() >= header_end + 4 + length
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let transport = DifyTransport::new("https://api.example/v1/", None).unwrap();
        assert_eq!(transport.endpoint(), "https://api.example/v1/chat-messages");
    }

    #[test]
    fn test_empty_base_rejected() {
        assert!(matches!(
            DifyTransport::new("  ", None),
            Err(DifyError::EmptyApiBase)
        ));
    }

    #[tokio::test]
    async fn test_streams_body_and_sends_auth() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: text/event-stream\r\n\
             Connection: close\r\n\r\n\
             data: {\"event\":\"message\",\"answer\":\"Hi\"}\n\n\
             data: {\"event\":\"message_end\"}\n\n",
        )
        .await;

        let transport = local(base, Some("app-secret".to_string()));
        let response = transport
            .open(&StreamRequest::new("hello", "alice"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        let chunks: Vec<_> = response.body.collect().await;
        let body: Vec<u8> = chunks.into_iter().flat_map(Result::unwrap).collect();
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains("\"answer\":\"Hi\""));
        assert!(body.contains("message_end"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat-messages"));
        assert!(request.to_lowercase().contains("authorization: bearer app-secret"));
        assert!(request.contains("\"response_mode\":\"streaming\""));
        assert!(request.contains("\"query\":\"hello\""));
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_raised() {
        let (base, _server) =
            serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        let transport = local(base, None);
        let response = transport
            .open(&StreamRequest::new("hello", "alice"))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = local(format!("http://{addr}"), None);
        let error = transport
            .open(&StreamRequest::new("hello", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(error, TransportError::Connection(_)));
    }
}
