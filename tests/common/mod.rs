//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tenant_gateway::config::GatewayConfig;
use tenant_gateway::http::HttpServer;
use tenant_gateway::lifecycle::Shutdown;

/// A request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Requests received by a mock upstream.
#[derive(Debug, Default)]
pub struct Recorder {
    requests: Mutex<Vec<Recorded>>,
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Recorded> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[derive(Clone)]
struct BackendState {
    recorder: Arc<Recorder>,
    status: StatusCode,
    body: &'static str,
}

async fn record(State(state): State<BackendState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    state.recorder.requests.lock().unwrap().push(Recorded {
        method: parts.method,
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default(),
        headers: parts.headers,
        body,
    });

    (
        state.status,
        [("content-type", "application/json"), ("x-upstream", "mock")],
        state.body,
    )
        .into_response()
}

/// Start a mock upstream that records every request and answers with a
/// fixed status and JSON body.
pub async fn start_recording_backend(
    status: StatusCode,
    body: &'static str,
) -> (SocketAddr, Arc<Recorder>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder = Arc::new(Recorder::default());

    let app = Router::new().fallback(record).with_state(BackendState {
        recorder: recorder.clone(),
        status,
        body,
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, recorder)
}

/// Start an upstream that accepts connections but never answers.
///
/// Returns the number of currently open connections; a connection counts
/// as closed once the peer hangs up.
pub async fn start_silent_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let open = Arc::new(AtomicUsize::new(0));

    let counter = open.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let counter = counter.clone();
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) => continue,
                            }
                        }
                        counter.fetch_sub(1, Ordering::SeqCst);
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, open)
}

/// Start an upstream that announces a body it never finishes.
///
/// Each connection gets a `200` head with `content-length: 100`, a few body
/// bytes, then a closed socket.
pub async fn start_truncating_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"partial\":")
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway config routing each `(tenant, addr)` pair.
pub fn gateway_config(upstreams: &[(&str, SocketAddr)]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.routing.upstreams = upstreams
        .iter()
        .map(|(tenant, addr)| (tenant.to_string(), format!("http://{addr}")))
        .collect::<BTreeMap<_, _>>();
    config
}

/// Start the gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Poll `check` until it holds or `deadline` passes.
pub async fn eventually(deadline: Duration, check: impl Fn() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}
