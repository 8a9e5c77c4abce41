use std::time::Duration;

use contact_relay::configuration::{get_configuration, Settings};
use contact_relay::contact_client::{ContactClient, FormEncoding};
use contact_relay::startup::Application;
use contact_relay::telemetry::{get_subscriber, init_subscriber};
use once_cell::sync::Lazy;
use secrecy::Secret;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Ensure that the `tracing` stack is only initialised once rather than for each test case
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    // The sink is part of the type returned by `get_subscriber`, hence the two branches
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub email_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// `POST /api/contact` with a raw body.
    pub async fn post_contact(&self, body: String, content_type: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/api/contact", &self.address))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// `POST /contact` with a JSON body.
    pub async fn post_webhook(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/contact", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub fn contact_client(&self, route: &str, encoding: FormEncoding) -> ContactClient {
        let endpoint = reqwest::Url::parse(&format!("{}{}", &self.address, route))
            .expect("Invalid endpoint");
        ContactClient::new(endpoint, encoding, Duration::from_secs(5))
            .expect("Failed to build the contact client")
    }

    /// The JSON bodies the email provider received so far.
    pub async fn sent_emails(&self) -> Vec<serde_json::Value> {
        self.email_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }
}

/// Mounts a provider that accepts exactly `count` emails.
pub async fn expect_emails(app: &TestApp, count: u64) {
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "email_1"})))
        .expect(count)
        .mount(&app.email_server)
        .await;
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spin up the application in the background, tweaking its configuration first.
pub async fn spawn_app_with(customise: impl FnOnce(&mut Settings)) -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // Next invocations get skipped
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // A random OS port
        c.application.port = 0;
        c.email_client.base_url = email_server.uri();
        c.email_client.api_key = Some(Secret::new("re_test_key".to_string()));
        c.email_client.dry_run = false;
        c.contact.recipients = Some("owner@example.com, backup@example.com".to_string());
        c.contact.sender_email = Some("relay@example.com".to_string());
        c.contact.subject_prefix = None;
        c.contact.basic_auth_username = None;
        c.contact.basic_auth_password = None;
        customise(&mut c);
        c
    };

    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        email_server,
        api_client: reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap(),
    }
}
