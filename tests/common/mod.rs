#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const TOKEN_HEADER: &str = "Login-Token";

/// Whitelist seeded into the test server.
pub const WHITELIST: &str = "u1:USER,admin1:ADMIN,op1:OPERATOR";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Nothing listens here, so chat requests degrade instead of waiting on a model
        let model_port = portpicker::pick_unused_port().context("failed to pick model port")?;

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_chatbi-api"));
        cmd.env("APP_ENV", "development")
            .env("CHATBI_HOST", "127.0.0.1")
            .env("CHATBI_PORT", port.to_string())
            .env("AUTH_WHITELIST", WHITELIST)
            .env_remove("AUTH_WHITELIST_FILE")
            .env_remove("AUTH_TOKEN_HEADER")
            .env("LLM_BASE_URL", format!("http://127.0.0.1:{}", model_port))
            .env("LLM_TIMEOUT", "2s")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline { break; }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    // Use stable get_or_init and convert init errors into a panic with context.
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// JSON credential for `user_id` with the given roles.
pub fn credential(user_id: &str, roles: &[&str]) -> String {
    serde_json::json!({ "userId": user_id, "roleNames": roles }).to_string()
}

pub trait WithCredential {
    fn credential(self, value: &str) -> Self;
}

impl WithCredential for RequestBuilder {
    fn credential(self, value: &str) -> Self {
        self.header(TOKEN_HEADER, value)
    }
}
