use secrecy::ExposeSecret;

use crate::authentication::Credentials;
use crate::configuration::Settings;
use crate::email_client::{EmailClient, Mailer};

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("No recipient address is configured")]
    MissingRecipients,
    #[error("No sender address is configured")]
    MissingSender,
    #[error("No email provider API key is configured and dry run is disabled")]
    MissingApiKey,
    #[error("Failed to build the email provider client")]
    HttpClient(#[from] reqwest::Error),
}

/// Everything the contact endpoints need, built once at startup.
pub struct ContactRelay {
    pub recipients: Vec<String>,
    pub sender: String,
    pub subject_prefix: Option<String>,
    /// Required `Basic` credentials, only when username and password are both set.
    pub basic_auth: Option<Credentials>,
    pub mailer: Mailer,
}

impl ContactRelay {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigurationError> {
        let contact = &settings.contact;

        let recipients = parse_recipients(contact.recipients.as_deref().unwrap_or_default());
        if recipients.is_empty() {
            return Err(ConfigurationError::MissingRecipients);
        }
        let sender = non_blank(contact.sender_email.as_deref())
            .ok_or(ConfigurationError::MissingSender)?
            .to_string();

        // In dry run nothing leaves the process, so the API key may be missing.
        // Otherwise a blank key is as good as no key at all
        let mailer = if settings.email_client.dry_run {
            Mailer::DryRun
        } else {
            let api_key = settings
                .email_client
                .api_key
                .as_ref()
                .filter(|key| !key.expose_secret().trim().is_empty())
                .ok_or(ConfigurationError::MissingApiKey)?;
            Mailer::Resend(EmailClient::new(
                settings.email_client.base_url.clone(),
                api_key.clone(),
                settings.email_client.timeout(),
            )?)
        };

        // Auth is opt-in: a username without a password (or the other way
        // around) leaves the webhook open rather than locking everyone out
        let basic_auth = match (
            non_blank(contact.basic_auth_username.as_deref()),
            contact
                .basic_auth_password
                .as_ref()
                .filter(|password| !password.expose_secret().is_empty()),
        ) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.to_string(),
                password: password.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            recipients,
            sender,
            subject_prefix: non_blank(contact.subject_prefix.as_deref()).map(str::to_owned),
            basic_auth,
            mailer,
        })
    }
}

/// The relay as the request handlers see it.
pub enum RelayState {
    Ready(ContactRelay),
    Unconfigured(ConfigurationError),
}

impl RelayState {
    /// Configuration problems are logged here, once, and not re-checked per request.
    pub fn from_settings(settings: &Settings) -> Self {
        match ContactRelay::from_settings(settings) {
            Ok(relay) => {
                if relay.mailer.is_dry_run() {
                    tracing::warn!("Dry run enabled: contact messages are logged instead of sent");
                }
                RelayState::Ready(relay)
            }
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "The contact relay is not configured, contact requests will fail"
                );
                RelayState::Unconfigured(e)
            }
        }
    }

    pub fn relay(&self) -> Option<&ContactRelay> {
        match self {
            RelayState::Ready(relay) => Some(relay),
            RelayState::Unconfigured(_) => None,
        }
    }
}

/// Splits a comma separated address list, dropping blank entries.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_owned)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
