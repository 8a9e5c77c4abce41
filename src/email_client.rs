use std::time::Duration;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};

use crate::domain::RelayRequest;
use crate::email_request::SendEmailRequest;

#[derive(thiserror::Error, Debug)]
pub enum SendEmailError {
    #[error("The email provider answered with {status}")]
    Rejected { status: StatusCode, body: String },
    #[error("Failed to reach the email provider: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    /// One attempt, no retries: a failure goes straight back to the caller.
    #[tracing::instrument(
        name = "Send email through the provider",
        skip(self, email),
        fields(subject = %email.subject)
    )]
    pub async fn send_email(&self, email: &RelayRequest) -> Result<(), SendEmailError> {
        let url = format!("{}/emails", self.base_url.trim_end_matches('/'));
        let request_body = SendEmailRequest::from(email);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = %status,
            body = %body,
            "The email provider rejected the message"
        );
        Err(SendEmailError::Rejected { status, body })
    }
}

/// Delivers relay requests, either for real or by logging them.
pub enum Mailer {
    Resend(EmailClient),
    DryRun,
}

impl Mailer {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Mailer::DryRun)
    }

    pub async fn dispatch(&self, email: &RelayRequest) -> Result<(), SendEmailError> {
        match self {
            Mailer::Resend(client) => client.send_email(email).await,
            Mailer::DryRun => {
                tracing::info!(
                    recipients = ?email.recipients,
                    reply_to = ?email.reply_to,
                    subject = %email.subject,
                    text = %email.text_body,
                    "Dry run: would send contact email"
                );
                Ok(())
            }
        }
    }
}
