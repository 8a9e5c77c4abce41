use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode, Url};

/// How the form is put on the wire.
#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FormEncoding {
    Json,
    UrlEncoded,
}

#[derive(serde::Serialize, Debug, Clone)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error("The contact endpoint answered with {status}")]
    Rejected { status: StatusCode, body: String },
    #[error("Failed to reach the contact endpoint: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Submits contact forms to a relay endpoint.
///
/// Redirects are never followed: an endpoint has to answer with a `2xx`
/// for the submission to count as delivered.
pub struct ContactClient {
    http_client: Client,
    endpoint: Url,
    encoding: FormEncoding,
}

impl ContactClient {
    pub fn new(
        endpoint: Url,
        encoding: FormEncoding,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            endpoint,
            encoding,
        })
    }

    #[tracing::instrument(
        name = "Submit a contact form",
        skip(self, form),
        fields(endpoint = %self.endpoint, encoding = ?self.encoding)
    )]
    pub async fn submit(&self, form: &ContactForm) -> Result<(), SubmitError> {
        let builder = self.http_client.post(self.endpoint.clone());
        let builder = match self.encoding {
            FormEncoding::Json => builder.json(form),
            FormEncoding::UrlEncoded => builder.form(form),
        };

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SubmitError::Rejected { status, body })
    }
}
