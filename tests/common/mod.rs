//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::time::Duration;

use tenant_preview_proxy::config::ProxyConfig;
use tenant_preview_proxy::http::{AppState, HttpServer};
use tenant_preview_proxy::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Start an upstream that answers every request with a JSON echo of what it received.
pub async fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let body = echo_body(&head);
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn echo_body(head: &str) -> String {
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default();
    let target = request_line.next().unwrap_or_default();

    let header = |name: &str| {
        lines
            .clone()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.eq_ignore_ascii_case(name).then(|| value.trim().to_string())
            })
            .unwrap_or_default()
    };

    serde_json::json!({
        "method": method,
        "path": target,
        "host": header("host"),
        "request_id": header("x-request-id"),
    })
    .to_string()
}

/// A proxy running in the background of a test.
#[allow(dead_code)]
pub struct TestProxy {
    pub addr: SocketAddr,
    pub state: AppState,
    pub updates: mpsc::UnboundedSender<ProxyConfig>,
    pub shutdown: Shutdown,
}

impl TestProxy {
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a proxy in front of `upstream` with `config` on an ephemeral port.
pub async fn start_proxy(mut config: ProxyConfig, upstream: SocketAddr) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();
    config.upstream.address = upstream.to_string();

    let server = HttpServer::new(config).expect("valid test config");
    let state = server.state().clone();
    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestProxy {
        addr,
        state,
        updates,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Send a GET through the proxy with the given Host header and return the echo.
#[allow(dead_code)]
pub async fn get_echo(
    client: &reqwest::Client,
    proxy: &TestProxy,
    host: &str,
    path: &str,
) -> serde_json::Value {
    let res = client
        .get(proxy.url(path))
        .header(reqwest::header::HOST, host)
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(res.status(), 200, "unexpected status for {host}{path}");
    res.json().await.expect("echo body")
}
