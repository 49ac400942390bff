use relay_service::config::{InferenceConfig, RelayConfig, ScrapeConfig, SmtpConfig};
use relay_service::services::{
    CompletionProvider, EmailProvider, HuggingFaceProvider, MockEmailProvider, PageFetcher,
    TopicClassifier,
};
use relay_service::startup::{AppState, Application};
use secrecy::Secret;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const SENDER: &str = "monitor@example.com";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

/// Knobs for the collaborators a test wants to control.
pub struct TestSetup {
    /// Base URL of a stub inference API; `None` leaves classification on keywords.
    pub inference_url: Option<String>,
    pub email_provider: Arc<MockEmailProvider>,
}

impl Default for TestSetup {
    fn default() -> Self {
        Self {
            inference_url: None,
            email_provider: Arc::new(MockEmailProvider::new(SENDER)),
        }
    }
}

pub fn test_config(inference_url: Option<&str>) -> RelayConfig {
    RelayConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        scrape: ScrapeConfig { timeout_secs: 5 },
        inference: InferenceConfig {
            api_url: inference_url.unwrap_or("http://127.0.0.1:9").to_string(),
            api_key: inference_url.map(|_| Secret::new("test-key".to_string())),
            timeout_secs: 2,
        },
        smtp: SmtpConfig {
            host: "smtp.test.local".to_string(),
            port: 587,
            user: String::new(),
            password: Secret::new(String::new()),
            from_email: SENDER.to_string(),
            from_name: "Test Monitor".to_string(),
            timeout_secs: 5,
        },
        otlp_endpoint: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestSetup::default()).await
    }

    pub async fn spawn_with(setup: TestSetup) -> Self {
        let config = test_config(setup.inference_url.as_deref());

        let completion = HuggingFaceProvider::from_config(&config.inference)
            .expect("Failed to build completion provider")
            .map(|p| Arc::new(p) as Arc<dyn CompletionProvider>);

        let state = AppState {
            fetcher: PageFetcher::new(&config.scrape).expect("Failed to build fetcher"),
            classifier: TopicClassifier::new(completion),
            email_provider: setup.email_provider as Arc<dyn EmailProvider>,
        };

        let app = Application::build_with_state(&config, state)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
