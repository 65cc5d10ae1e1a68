//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub uri: String,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub body: String,
}

/// Requests recorded by a capture backend.
#[derive(Clone, Default)]
pub struct Capture {
    inner: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl Capture {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.inner.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<CapturedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "POST")
            .collect()
    }
}

#[derive(Clone)]
struct CaptureState {
    capture: Capture,
    post_status: u16,
    post_body: &'static str,
}

/// Start a backend that records every request. GETs (the health probes)
/// always succeed; POSTs answer with `post_status` and `post_body`.
pub async fn start_capture_backend(
    post_status: u16,
    post_body: &'static str,
) -> (SocketAddr, Capture, JoinHandle<()>) {
    let capture = Capture::default();
    let state = CaptureState {
        capture: capture.clone(),
        post_status,
        post_body,
    };
    let app = Router::new().fallback(capture_handler).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, capture, server)
}

async fn capture_handler(
    State(state): State<CaptureState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let is_post = method == Method::POST;
    state.capture.inner.lock().unwrap().push(CapturedRequest {
        method: method.to_string(),
        uri: uri.to_string(),
        authorization: header(&headers, "authorization"),
        user_agent: header(&headers, "user-agent"),
        body,
    });
    if is_post {
        (
            StatusCode::from_u16(state.post_status).unwrap(),
            state.post_body.to_string(),
        )
    } else {
        (StatusCode::OK, "Ok.\n".to_string())
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Start a raw backend that returns a fixed response to every request.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            response.len(),
                            response
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Poll `condition` until it holds, or panic after a few seconds.
pub async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for {what}");
}
