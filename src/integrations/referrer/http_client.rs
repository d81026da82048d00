// src/integrations/referrer/http_client.rs
//
// HTTP Referrer Client
//
// ARCHITECTURE:
// - Talks to a referrer endpoint that answers GET with
//   {"install_referrer": "<raw referrer string>"}
// - Maps HTTP results onto platform response codes
// - Never parses the referrer itself; that's the parser's job

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::task::JoinHandle;

use crate::app::config::ServiceConfig;
use crate::domain::ResponseCode;
use crate::error::{AppError, AppResult};
use crate::integrations::referrer::client::{CompletionCallback, PayloadProvider, ServiceClient};

/// Referrer details body
#[derive(Debug, Deserialize)]
struct ReferrerDetails {
    install_referrer: String,
}

pub struct HttpReferrerClient {
    http: Client,
    endpoint: Option<Url>,
    connected: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HttpReferrerClient {
    pub fn new(config: &ServiceConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let endpoint = match config.endpoint.as_deref() {
            Some(raw) => match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
                Ok(url) => {
                    log::warn!("[REFERRER] Unsupported endpoint scheme: {}", url.scheme());
                    None
                }
                Err(e) => {
                    log::warn!("[REFERRER] Invalid endpoint {:?}: {}", raw, e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            http,
            endpoint,
            connected: AtomicBool::new(false),
            task: Mutex::new(None),
        })
    }
}

impl ServiceClient for HttpReferrerClient {
    fn discover(&self) -> AppResult<bool> {
        Ok(self.endpoint.is_some())
    }

    fn connect(&self, on_complete: CompletionCallback) -> AppResult<()> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| AppError::Service("No referrer endpoint configured".to_string()))?;

        // Held until the handle is stored, so a fast completion's disconnect()
        // always finds it
        let mut task = self
            .task
            .lock()
            .map_err(|_| AppError::Other("referrer task lock poisoned".to_string()))?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::Service(format!("No async runtime to connect on: {}", e)))?;

        if self.connected.swap(true, Ordering::SeqCst) {
            return Err(AppError::Service("Referrer connection already opened".to_string()));
        }

        let http = self.http.clone();
        *task = Some(runtime.spawn(async move {
            let (code, body) = fetch_referrer(&http, endpoint).await;
            log::debug!("[REFERRER] Completion code {}", code);
            let payload: PayloadProvider = Box::new(move || decode_payload(body.as_deref()));
            on_complete(code, payload);
        }));

        Ok(())
    }

    fn disconnect(&self) -> AppResult<()> {
        let mut task = self
            .task
            .lock()
            .map_err(|_| AppError::Other("referrer task lock poisoned".to_string()))?;

        if let Some(handle) = task.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
        log::debug!("[REFERRER] Connection closed");
        Ok(())
    }
}

async fn fetch_referrer(http: &Client, endpoint: Url) -> (ResponseCode, Option<String>) {
    let response = match http.get(endpoint).send().await {
        Ok(response) => response,
        Err(e) if e.is_connect() => {
            log::warn!("[REFERRER] Could not connect: {}", e);
            return (ResponseCode::SERVICE_UNAVAILABLE, None);
        }
        Err(e) => {
            log::warn!("[REFERRER] Request dropped before answer: {}", e);
            return (ResponseCode::SERVICE_DISCONNECTED, None);
        }
    };

    let code = response_code_for_status(response.status());
    if !code.is_ok() {
        return (code, None);
    }

    match response.text().await {
        Ok(body) => (code, Some(body)),
        Err(e) => {
            log::warn!("[REFERRER] Body lost before answer: {}", e);
            (ResponseCode::SERVICE_DISCONNECTED, None)
        }
    }
}

fn response_code_for_status(status: StatusCode) -> ResponseCode {
    match status {
        s if s.is_success() => ResponseCode::OK,
        StatusCode::NOT_IMPLEMENTED => ResponseCode::FEATURE_NOT_SUPPORTED,
        StatusCode::SERVICE_UNAVAILABLE => ResponseCode::SERVICE_UNAVAILABLE,
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::NOT_FOUND => ResponseCode::DEVELOPER_ERROR,
        other => ResponseCode(i32::from(other.as_u16())),
    }
}

fn decode_payload(body: Option<&str>) -> AppResult<String> {
    let body = body.ok_or_else(|| AppError::Service("Referrer service sent no payload".to_string()))?;
    let details: ReferrerDetails = serde_json::from_str(body)?;
    Ok(details.install_referrer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    fn config_for(endpoint: Option<&str>) -> ServiceConfig {
        ServiceConfig {
            endpoint: endpoint.map(str::to_string),
            request_timeout_ms: 2000,
        }
    }

    /// Answers a single HTTP request with a canned response
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/install-referrer", addr)
    }

    fn capture(client: &HttpReferrerClient) -> oneshot::Receiver<(ResponseCode, AppResult<String>)> {
        let (tx, rx) = oneshot::channel();
        client
            .connect(Box::new(move |code: ResponseCode, payload: PayloadProvider| {
                let _ = tx.send((code, payload()));
            }))
            .unwrap();
        rx
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(response_code_for_status(StatusCode::OK), ResponseCode::OK);
        assert_eq!(
            response_code_for_status(StatusCode::NOT_IMPLEMENTED),
            ResponseCode::FEATURE_NOT_SUPPORTED
        );
        assert_eq!(
            response_code_for_status(StatusCode::SERVICE_UNAVAILABLE),
            ResponseCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            response_code_for_status(StatusCode::FORBIDDEN),
            ResponseCode::DEVELOPER_ERROR
        );
        assert_eq!(
            response_code_for_status(StatusCode::INTERNAL_SERVER_ERROR),
            ResponseCode(500)
        );
    }

    #[test]
    fn test_decode_payload() {
        let raw = decode_payload(Some(r#"{"install_referrer":"utm_campaign=xyz"}"#)).unwrap();
        assert_eq!(raw, "utm_campaign=xyz");

        assert!(matches!(decode_payload(Some("{}")), Err(AppError::Serialization(_))));
        assert!(matches!(decode_payload(None), Err(AppError::Service(_))));
    }

    #[test]
    fn test_discover_requires_valid_http_endpoint() {
        let cases = [
            (None, false),
            (Some("not a url"), false),
            (Some("ftp://example.com/referrer"), false),
            (Some("http://127.0.0.1:9/referrer"), true),
        ];

        for (endpoint, expected) in cases {
            let client = HttpReferrerClient::new(&config_for(endpoint)).unwrap();
            assert_eq!(client.discover().unwrap(), expected, "endpoint {:?}", endpoint);
        }
    }

    #[test]
    fn test_connect_without_runtime_fails_synchronously() {
        let client = HttpReferrerClient::new(&config_for(Some("http://127.0.0.1:9/r"))).unwrap();
        let result = client.connect(Box::new(|_, _| {}));
        assert!(matches!(result, Err(AppError::Service(_))));
    }

    #[test]
    fn test_failed_connect_does_not_use_up_the_connection() {
        let client = HttpReferrerClient::new(&config_for(Some("http://127.0.0.1:9/r"))).unwrap();
        assert!(client.connect(Box::new(|_, _| {})).is_err());

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        assert!(client.connect(Box::new(|_, _| {})).is_ok());
        client.disconnect().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fast_completion_can_disconnect() {
        let endpoint = serve_once("503 Service Unavailable", "").await;
        let client = Arc::new(HttpReferrerClient::new(&config_for(Some(&endpoint))).unwrap());

        let (tx, rx) = oneshot::channel();
        let client_clone = Arc::clone(&client);
        client
            .connect(Box::new(move |code: ResponseCode, _payload: PayloadProvider| {
                let _ = tx.send((code, client_clone.disconnect().is_ok()));
            }))
            .unwrap();

        let (code, disconnected) = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(code, ResponseCode::SERVICE_UNAVAILABLE);
        assert!(disconnected);
        assert!(client.task.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_without_endpoint_fails() {
        let client = HttpReferrerClient::new(&config_for(None)).unwrap();
        assert!(client.connect(Box::new(|_, _| {})).is_err());
    }

    #[tokio::test]
    async fn test_ok_response_delivers_payload() {
        let endpoint = serve_once("200 OK", r#"{"install_referrer":"utm_campaign=xyz"}"#).await;
        let client = HttpReferrerClient::new(&config_for(Some(&endpoint))).unwrap();

        let rx = capture(&client);
        let (code, payload) = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(code, ResponseCode::OK);
        assert_eq!(payload.unwrap(), "utm_campaign=xyz");
        client.disconnect().unwrap();
    }

    #[tokio::test]
    async fn test_unavailable_response_is_reported() {
        let endpoint = serve_once("503 Service Unavailable", "").await;
        let client = HttpReferrerClient::new(&config_for(Some(&endpoint))).unwrap();

        let rx = capture(&client);
        let (code, _) = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(code, ResponseCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_second_connect_is_rejected() {
        let endpoint = serve_once("200 OK", r#"{"install_referrer":""}"#).await;
        let client = HttpReferrerClient::new(&config_for(Some(&endpoint))).unwrap();

        let _rx = capture(&client);
        assert!(client.connect(Box::new(|_, _| {})).is_err());
        client.disconnect().unwrap();
        client.disconnect().unwrap();
    }
}
