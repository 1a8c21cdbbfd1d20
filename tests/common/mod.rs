use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Integration tests need a reachable Postgres; without DATABASE_URL they
/// skip rather than fail.
pub fn db_configured() -> bool {
    if std::env::var("DATABASE_URL").is_ok() {
        true
    } else {
        eprintln!("skipping: DATABASE_URL not set");
        false
    }
}

/// Unique-per-run suffix to keep usernames and farm names from colliding
/// across repeated test runs against the same database.
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .subsec_nanos();
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_millis();
    format!("{}_{}_{}", prefix, millis, nanos % 1000)
}

pub struct TestServer {
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/farmstead-api");
        cmd.env("FARMSTEAD_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL and JWT_SECRET
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Register a fresh user and return (username, bearer token)
pub async fn register_and_login(base_url: &str) -> Result<(String, String)> {
    let client = reqwest::Client::new();
    let username = unique("tester");

    let resp = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "name": "Test User",
            "password": "hunter2hunter2",
            "password_confirm": "hunter2hunter2",
        }))
        .send()
        .await?;
    anyhow::ensure!(
        resp.status() == StatusCode::OK,
        "register failed: {}",
        resp.text().await?
    );

    let resp = client
        .post(format!("{}/auth/login", base_url))
        .json(&serde_json::json!({
            "username": username,
            "password": "hunter2hunter2",
        }))
        .send()
        .await?;
    anyhow::ensure!(
        resp.status() == StatusCode::OK,
        "login failed: {}",
        resp.text().await?
    );
    let body: serde_json::Value = resp.json().await?;
    let token = body["data"]["token"]
        .as_str()
        .context("token missing from login response")?
        .to_string();

    Ok((username, token))
}
