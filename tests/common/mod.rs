use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use zeni::clock::ManualClock;
use zeni::config::{Config, StoreBackend};
use zeni::store::MemoryRecordStore;
use zeni::store::postgres::PoolSettings;

/// A running test server backed by a fresh in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<MemoryRecordStore>,
    pub clock: Arc<ManualClock>,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> (Value, StatusCode) {
        self.post("/api/register", &json!({ "name": name, "email": email, "password": password }))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post("/api/login", &json!({ "email": email, "password": password }))
            .await
    }

    /// Request a reset for `email` and return the token from the exposed link.
    pub async fn reset_token_for(&self, email: &str) -> String {
        let (body, status) = self
            .post("/api/forgot-password", &json!({ "email": email }))
            .await;
        assert_eq!(status, StatusCode::OK, "forgot-password failed: {body}");
        let link = body["reset_link"].as_str().expect("reset_link missing");
        link.split("token=").nth(1).unwrap().to_string()
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config() -> Config {
    Config {
        store: StoreBackend::Memory,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        frontend_url: "http://localhost:3000".to_string(),
        pool: PoolSettings::default(),
        expose_reset_link: true,
        log_level: "warn".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let store = Arc::new(MemoryRecordStore::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
    ));

    let app = zeni::build_app_with_clock(store.clone(), config, clock.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        store,
        clock,
        client: Client::new(),
    }
}
