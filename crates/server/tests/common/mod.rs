//! # Common Test Utilities
//!
//! This module centralizes the test harness shared by the `shoptalk-server`
//! integration tests. `TestApp` spawns a real server on a random port,
//! backed by a temporary SQLite database and an AI provider pointed at an
//! `httpmock::MockServer` instance.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::Result;
use httpmock::MockServer;
use reqwest::Client;
use shoptalk_server::{
    config::get_config,
    router::create_router,
    state::{build_app_state, AppState},
};
use std::{fs::File, io::Write, net::SocketAddr};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

/// A harness for end-to-end testing of the Axum server.
///
/// This struct spawns the server on a random available port, sets up a
/// temporary SQLite database, and points the AI provider at the mock server's
/// OpenAI-compatible endpoint.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _db_file: NamedTempFile,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start();
        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_path_buf();

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: "{}"
ai:
  provider: "local"
  api_url: "{}"
  api_key: null
  model_name: "mock-chat-model"
"#,
            db_path.to_str().expect("db path is not valid UTF-8"),
            mock_server.url("/v1/chat/completions"),
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = get_config(Some(config_path.to_str().expect("config path")))?;
        let app_state = build_app_state(config).await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let app_state_for_harness = app_state.clone();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = create_router(app_state);
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state: app_state_for_harness,
            _db_file: db_file,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Seeds the temporary database with a small `ad_sales` table.
    pub async fn seed_ad_sales(&self) -> Result<()> {
        self.app_state
            .sqlite_provider
            .initialize_with_data(
                "CREATE TABLE ad_sales (item_id INTEGER, ad_spend REAL, clicks INTEGER);
                 INSERT INTO ad_sales (item_id, ad_spend, clicks) VALUES (22, 54.0, 6);
                 INSERT INTO ad_sales (item_id, ad_spend, clicks) VALUES (7, 12.5, 50);",
            )
            .await?;
        Ok(())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
