#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use staybook_api::api::{app, AppState};

/// A server on a free port, backed by a fresh in-memory store.
///
/// The server task lives on the calling test's runtime, so every test gets
/// its own isolated instance.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    client: reqwest::Client,
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(AppState::in_memory())).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return status plus decoded JSON body
    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(user) = user {
            request = request.bearer_auth(&user.token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::GET, path, user, None).await
    }

    pub async fn post(&self, path: &str, user: Option<&TestUser>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::POST, path, user, Some(body)).await
    }

    pub async fn put(&self, path: &str, user: Option<&TestUser>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::PUT, path, user, Some(body)).await
    }

    pub async fn delete(&self, path: &str, user: Option<&TestUser>) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::DELETE, path, user, None).await
    }

    /// Sign up a fresh account and keep its token
    pub async fn signup(&self, email: &str) -> Result<TestUser> {
        let (status, body) = self
            .post(
                "/users",
                None,
                json!({
                    "firstName": "Demo",
                    "lastName": "User",
                    "email": email,
                    "password": "password",
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {} {}", status, body);

        Ok(TestUser {
            id: body["user"]["id"].as_i64().context("signup response has no user id")?,
            email: email.to_string(),
            token: body["token"].as_str().context("signup response has no token")?.to_string(),
        })
    }

    /// Create a spot named `name` owned by `owner`; returns its id
    pub async fn create_spot(&self, owner: &TestUser, name: &str) -> Result<i64> {
        let mut body = cabin();
        body["name"] = json!(name);
        let (status, spot) = self.post("/spots", Some(owner), body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "spot creation failed: {} {}", status, spot);
        spot["id"].as_i64().context("spot response has no id")
    }

    /// Review `spot_id` as `author`; returns the review id
    pub async fn create_review(&self, author: &TestUser, spot_id: i64, stars: i64) -> Result<i64> {
        let (status, review) = self
            .post(
                &format!("/spots/{}/reviews", spot_id),
                Some(author),
                json!({ "review": "Lovely stay", "stars": stars }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "review creation failed: {} {}", status, review);
        review["id"].as_i64().context("review response has no id")
    }
}

pub fn cabin() -> Value {
    json!({
        "address": "1 Main St",
        "city": "X",
        "state": "Y",
        "country": "Z",
        "lat": 0,
        "lng": 0,
        "name": "Cabin",
        "description": "Nice",
        "price": 100,
    })
}
