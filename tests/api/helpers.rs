use gamefowl_farm::{
    configuration::{get_configuration, LogFormat, LogSettings},
    database::get_connection_pool,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use sqlx::PgPool;

#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub port: u16,
    pub api_client: reqwest::Client,
}

static TRACING: Lazy<()> = Lazy::new(|| {
    let log = LogSettings {
        level: "info".to_string(),
        format: LogFormat::Pretty,
    };
    let test_log = std::env::var("TEST_LOG")
        .map(|value| value == "true")
        .unwrap_or(false);
    if test_log {
        init_subscriber(get_subscriber(&log, std::io::stdout));
    } else {
        init_subscriber(get_subscriber(&log, std::io::sink));
    }
});

impl TestApp {
    /// Opens an anonymous session and returns its bearer token.
    pub async fn open_session(&self) -> String {
        let response = self
            .api_client
            .post(format!("{}/auth/session", &self.address))
            .send()
            .await
            .expect("Failed to execute request.");
        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.expect("Invalid session body");
        body["data"]["token"]
            .as_str()
            .expect("Session token missing")
            .to_string()
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.application.workers = 1;
        c
    };
    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application.");
    let application_port = application.port();

    let address = format!("http://127.0.0.1:{}", application_port);
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        db_pool: get_connection_pool(&configuration.database),
        port: application_port,
        api_client: reqwest::Client::new(),
    }
}
