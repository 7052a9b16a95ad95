use std::net::TcpListener as StdListener;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tracing_subscriber::EnvFilter;

use jobly_api::app::app;
use jobly_api::config::CONFIG;
use jobly_api::database::DatabaseManager;
use jobly_api::state::AppState;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// In-process server on its own runtime thread so it outlives each test's runtime.
///
/// The pool is lazy: requests that fail validation never touch Postgres.
/// With `DATABASE_URL` set, migrations run before the server starts answering.
pub struct TestServer {
    pub base_url: String,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = StdListener::bind(("127.0.0.1", port)).context("failed to bind test port")?;
        listener.set_nonblocking(true)?;

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let pool = DatabaseManager::connect_lazy(&CONFIG.database).expect("lazy pool");
                if database_configured() {
                    DatabaseManager::run_migrations(&pool).await.expect("migrations");
                }
                let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");
                axum::serve(listener, app(AppState::new(pool))).await.expect("server");
            });
        });

        Ok(Self { base_url: format!("http://127.0.0.1:{}", port) })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(&self.base_url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn test server"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

fn database_configured() -> bool {
    std::env::var("DATABASE_URL").is_ok_and(|url| !url.is_empty())
}

/// Server backed by a live database, or `None` (test skipped) when `DATABASE_URL` is unset.
pub async fn ensure_database_server() -> Result<Option<&'static TestServer>> {
    let _ = dotenvy::dotenv();
    if !database_configured() {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
        return Ok(None);
    }
    ensure_server().await.map(Some)
}

/// Short unique suffix so parallel tests never collide on handles or usernames.
pub fn unique(prefix: &str) -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.subsec_nanos()).unwrap_or(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{:x}{:x}{}", prefix, std::process::id(), nanos, n)
}

pub fn admin_token() -> String {
    jobly_api::auth::create_token("admin", true).expect("admin token")
}

pub fn user_token(username: &str) -> String {
    jobly_api::auth::create_token(username, false).expect("user token")
}
