use std::path::PathBuf;

use insights_waitlist::configuration::get_configuration;
use insights_waitlist::domain::WaitlistEntry;
use insights_waitlist::startup::Application;
use insights_waitlist::telemetry::get_subscriber;
use insights_waitlist::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use uuid::Uuid;
use wiremock::MockServer;

/// Init the tracing subscriber once only, no matter how many tests call
/// `spawn_app`.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different closure types, hence the match arms
    match std::env::var("TEST_LOG") {
        Ok(_) => init_subscriber(get_subscriber("test", "debug", std::io::stdout)),
        Err(_) => init_subscriber(get_subscriber("test", "debug", std::io::sink)),
    };
});

pub struct TestApp {
    pub addr: String,
    pub log_path: PathBuf,
    /// stands in for the analysis backend
    pub backend_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// `POST /waitlist` with a raw `application/x-www-form-urlencoded` body
    pub async fn post_waitlist(
        &self,
        body: String,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/waitlist", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("execute request")
    }

    /// Like `post_waitlist`, but urlencodes the fields for us
    pub async fn post_waitlist_form(
        &self,
        fields: &[(&str, &str)],
    ) -> reqwest::Response {
        let body = serde_urlencoded::to_string(fields).unwrap();
        self.post_waitlist(body).await
    }

    pub async fn post_chat(
        &self,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/chat", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_upload(
        &self,
        query: &str,
        contents: &'static [u8],
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/upload?{query}", self.addr))
            .header("Content-Type", "text/csv")
            .body(contents)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_cleanup(&self) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/cleanup", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    /// Raw log contents; `None` if the log was never created
    pub fn log_contents(&self) -> Option<String> { std::fs::read_to_string(&self.log_path).ok() }

    /// Parse the log back, like any other CSV reader would
    pub fn log_entries(&self) -> Vec<WaitlistEntry> {
        csv::Reader::from_path(&self.log_path)
            .expect("waitlist log exists")
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("waitlist log is valid csv")
    }
}

/// Spawn the app with default config, except for a random port, a fresh log
/// file, and a mock backend.
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let backend_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().expect("Failed to read configuration");
        // port 0 is reserved by the OS; the server will be spawned on a random
        // available port, retrieved later with `get_port`
        cfg.application.port = 0;
        // a log per test, so tests can run in parallel
        cfg.waitlist.log_path = std::env::temp_dir()
            .join("insights-waitlist-tests")
            .join(format!("{}.csv", Uuid::new_v4()));
        cfg.backend.base_url = backend_server.uri();
        cfg.backend.timeout_milliseconds = 2_000;
        cfg
    };

    let app = Application::build(cfg.clone())
        .await
        .expect("Failed to build application");
    let addr = format!("http://127.0.0.1:{}", app.get_port());
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        log_path: cfg.waitlist.log_path,
        backend_server,
        api_client: reqwest::Client::new(),
    }
}
