// ABOUTME: HTTP verification request sent through the proxy after cutover.
// ABOUTME: Plain HTTP/1 GET over TCP; expects a JSON body carrying a `version` field.

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{Request, Uri};
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tokio::net::TcpStream;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid verification URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("proxy answered with status {0}")]
    Status(u16),

    #[error("response is not JSON with a `version` field: {0}")]
    MissingVersion(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// GET `url` and return the `version` reported in the JSON body.
///
/// `host` overrides the Host header, so name-based virtual hosts on the proxy
/// route the request the way they would for real traffic.
pub async fn probe_version(
    url: &str,
    host: Option<&str>,
    timeout: Duration,
) -> Result<String, ProbeError> {
    tokio::time::timeout(timeout, fetch_version(url, host))
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
}

async fn fetch_version(url: &str, host: Option<&str>) -> Result<String, ProbeError> {
    let invalid = |reason: &str| ProbeError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = url.parse().map_err(|_| invalid("unparseable"))?;
    if uri.scheme_str() != Some("http") {
        return Err(invalid("only http:// is supported"));
    }
    let authority_host = uri.host().ok_or_else(|| invalid("missing host"))?;
    let port = uri.port_u16().unwrap_or(80);
    let addr = format!("{}:{}", authority_host, port);
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    let req = Request::builder()
        .method("GET")
        .uri(path)
        .header("Host", host.unwrap_or(authority_host))
        .header("Accept", "application/json")
        .body(Empty::<Bytes>::new())
        .map_err(|e| ProbeError::Http(e.to_string()))?;

    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| ProbeError::Connect {
            addr: addr.clone(),
            source,
        })?;
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| ProbeError::Http(format!("handshake failed: {}", e)))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("verification connection closed: {}", e);
        }
    });

    let response = sender
        .send_request(req)
        .await
        .map_err(|e| ProbeError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProbeError::Status(status.as_u16()));
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| ProbeError::Http(format!("failed to read body: {}", e)))?
        .to_bytes();

    extract_version(&body)
}

fn extract_version(body: &[u8]) -> Result<String, ProbeError> {
    let snippet = || String::from_utf8_lossy(&body[..body.len().min(200)]).into_owned();

    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ProbeError::MissingVersion(snippet()))?;

    match value.get("version") {
        Some(serde_json::Value::String(v)) => Ok(v.clone()),
        Some(v) if !v.is_null() => Ok(v.to_string()),
        _ => Err(ProbeError::MissingVersion(snippet())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on an ephemeral port; returns the URL
    /// and a handle yielding the raw request.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (format!("http://{}/api/", addr), handle)
    }

    #[tokio::test]
    async fn reads_version_from_json_body() {
        let body = r#"{"version":"1.4.2","status":"ok"}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (url, server) = serve_once(response).await;

        let version = probe_version(&url, Some("example.com"), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(version, "1.4.2");
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/ HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("host: example.com"));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (url, _server) = serve_once(
            "HTTP/1.1 502 Bad Gateway\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string(),
        )
        .await;

        let err = probe_version(&url, None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Status(502)));
    }

    #[test]
    fn body_without_version_is_rejected() {
        assert!(matches!(
            extract_version(br#"{"status":"ok"}"#),
            Err(ProbeError::MissingVersion(_))
        ));
        assert!(matches!(
            extract_version(b"<html>502</html>"),
            Err(ProbeError::MissingVersion(_))
        ));
    }

    #[test]
    fn numeric_version_is_accepted() {
        assert_eq!(extract_version(br#"{"version":3}"#).unwrap(), "3");
    }

    #[tokio::test]
    async fn https_is_refused() {
        let err = probe_version("https://example.com/", None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::InvalidUrl { .. }));
    }
}
