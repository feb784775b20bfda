//! Test helpers: a local HTTP server standing in for Slack's response URLs.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use tokio::{net::TcpListener, sync::mpsc, time::timeout};

/// A callback received by the capture server.
#[derive(Debug)]
pub struct Delivery {
    pub content_type: Option<String>,
    pub body: serde_json::Value,
    pub received_at: Instant,
}

#[derive(Clone)]
struct CaptureState {
    tx: mpsc::UnboundedSender<Delivery>,
    status: StatusCode,
}

pub struct CaptureServer {
    addr: SocketAddr,
    rx: mpsc::UnboundedReceiver<Delivery>,
}

impl CaptureServer {
    pub async fn start() -> Self {
        Self::start_with_status(StatusCode::OK).await
    }

    pub async fn start_with_status(status: StatusCode) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = Router::new()
            .route("/callback", post(capture))
            .with_state(CaptureState { tx, status });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, rx }
    }

    pub fn url(&self) -> String {
        format!("http://{}/callback", self.addr)
    }

    /// Wait for the next delivery, failing the test after five seconds.
    pub async fn next(&mut self) -> Delivery {
        timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for a callback")
            .expect("capture server stopped")
    }

    pub async fn next_within(&mut self, wait: Duration) -> Option<Delivery> {
        timeout(wait, self.rx.recv()).await.ok().flatten()
    }
}

async fn capture(
    State(state): State<CaptureState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let delivery = Delivery {
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
        received_at: Instant::now(),
    };
    let _ = state.tx.send(delivery);
    state.status
}
