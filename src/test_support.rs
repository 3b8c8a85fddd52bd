//! Canned HTTP upstreams for unit tests.
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

/// HTTP client that never goes through an environment proxy.
pub(crate) fn client() -> reqwest::Client {
    let Ok(client) = reqwest::Client::builder().no_proxy().build() else {
        panic!("failed to build test client");
    };
    client
}

/// Serves `router` on an ephemeral localhost port.
pub(crate) async fn spawn(router: Router) -> SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Stand-in for the public price API.
///
/// - `/price` answers like dolarapi with `promedio = 36.5`
/// - `/price/no-date` omits `fechaActualizacion`
/// - `/slow` answers after five seconds
/// - `/unavailable` answers 503
/// - `/missing-field` answers 200 without `promedio`
/// - `/not-json` answers 200 with plain text
pub(crate) async fn price_api() -> String {
    let router = Router::new()
        .route(
            "/price",
            get(|| async {
                Json(json!({
                    "fuente": "oficial",
                    "nombre": "Oficial",
                    "compra": null,
                    "venta": null,
                    "promedio": 36.5,
                    "fechaActualizacion": "2024-05-10T16:00:00.000Z"
                }))
            }),
        )
        .route(
            "/price/no-date",
            get(|| async { Json(json!({ "promedio": 40.12 })) }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "promedio": 1.0 }))
            }),
        )
        .route(
            "/unavailable",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        )
        .route(
            "/missing-field",
            get(|| async { Json(json!({ "fuente": "oficial" })) }),
        )
        .route("/not-json", get(|| async { "definitely not json" }));

    format!("http://{}", spawn(router).await)
}

/// JSON bodies received by a [`capture_server`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Captured(Arc<Mutex<Vec<Value>>>);

impl Captured {
    fn push(&self, body: Value) {
        if let Ok(mut bodies) = self.0.lock() {
            bodies.push(body);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.0.lock().map(|bodies| bodies.len()).unwrap_or(0)
    }

    pub(crate) fn bodies(&self) -> Vec<Value> {
        self.0.lock().map(|bodies| bodies.clone()).unwrap_or_default()
    }
}

/// Accepts JSON POSTs on `/` and answers every one with `status`.
pub(crate) async fn capture_server(status: StatusCode) -> (String, Captured) {
    let captured = Captured::default();
    let sink = captured.clone();
    let router = Router::new().route(
        "/",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                sink.push(body);
                status
            }
        }),
    );

    let addr = spawn(router).await;
    (format!("http://{addr}/"), captured)
}

/// Accepts connections and never answers.
pub(crate) async fn silent_server() -> String {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no local address");
    };
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{addr}/")
}

/// An address nothing listens on.
pub(crate) async fn closed_port() -> String {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no local address");
    };
    drop(listener);
    format!("http://{addr}/")
}
