//! Shared helpers for integration tests: spawn the real server on an
//! ephemeral port and talk to it over HTTP and WebSocket.
#![allow(dead_code)]

use book_catalog::api::{create_router, CatalogState};
use book_catalog::{build_state, AuthConfig, Config, UserAccountConfig};
use futures::StreamExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const TEST_SECRET: &str = "integration-secret-key-at-least-32-chars";

/// A running server plus a handle on its state, for registry assertions.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: CatalogState,
}

impl TestServer {
    pub fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, query: &str) -> String {
        format!("ws://{}/ws/events{}", self.addr, query)
    }
}

fn auth_config() -> AuthConfig {
    let mut auth = AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_secs: 3600,
        secure_cookies: false,
        users: ["admin", "demo"]
            .into_iter()
            .map(|name| UserAccountConfig {
                username: name.to_string(),
                password_hash: name.to_string(),
            })
            .collect(),
    };
    auth.hash_plaintext_passwords(4).unwrap();
    auth
}

/// Spawn the app with the `admin`/`demo` accounts and the two seed books
pub async fn spawn_server() -> TestServer {
    spawn_server_with(Some(auth_config())).await
}

pub async fn spawn_server_with(auth_config: Option<AuthConfig>) -> TestServer {
    let config = Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        subscriber_capacity: 64,
        ping_interval_secs: 30,
        seed_books: true,
        auth_config,
    };
    let state = build_state(&config);
    let app = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { addr, state }
}

/// Log in and return the JWT from the response body
pub async fn login(server: &TestServer, username: &str) -> String {
    let resp = reqwest::Client::new()
        .post(server.http("/api/auth/login"))
        .json(&json!({ "username": username, "password": username }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

pub fn dune() -> Value {
    json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "isbn": "978-0-441-17271-9",
        "publishedYear": 1965,
        "genre": "Science Fiction"
    })
}

/// Open a WebSocket subscription and wait until the server has registered it.
pub async fn subscribe(server: &TestServer, query: &str) -> WsStream {
    let before = server.state.event_bus.subscriber_count();
    let (ws, _) = connect_async(server.ws_url(query)).await.unwrap();
    wait_for_subscribers(server, before + 1).await;
    ws
}

/// Poll the registry until it holds exactly `n` channels.
pub async fn wait_for_subscribers(server: &TestServer, n: usize) {
    let bus = &server.state.event_bus;
    tokio::time::timeout(Duration::from_secs(5), async {
        while bus.subscriber_count() != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {} subscribers, registry has {}",
            n,
            bus.subscriber_count()
        )
    });
}

/// Next JSON text frame, failing after two seconds.
pub async fn next_event(ws: &mut WsStream) -> Value {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<Value>(text.as_str()).unwrap()
                }
                Some(Ok(_)) => continue,
                other => panic!("stream ended: {:?}", other),
            }
        }
    })
    .await
    .expect("timed out waiting for an event")
}

/// Assert nothing arrives within a short window.
pub async fn assert_no_event(ws: &mut WsStream) {
    let res = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(res.is_err(), "unexpected frame: {:?}", res);
}
