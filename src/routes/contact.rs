use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use actix_web::http::header::{self, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::{ContactFields, MessageLayout, RelayRequest};
use crate::email_client::SendEmailError;
use crate::relay::{ContactRelay, RelayState};
use crate::routes::{
    content_type, error_chain_fmt, parse_payload, read_body, MAX_BODY_SIZE, MAX_FIELD_LENGTH,
    MAX_MESSAGE_LENGTH,
};

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Contact service not configured.")]
    ServiceUnconfigured,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Missing required fields.")]
    MissingFields,
    #[error("Unauthorized")]
    Unauthorized(#[source] anyhow::Error),
    #[error("Unable to send message via email provider.")]
    ProviderDispatchFailed { status: u16, details: String },
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for ContactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<SendEmailError> for ContactError {
    fn from(e: SendEmailError) -> Self {
        match e {
            SendEmailError::Rejected { status, body } => ContactError::ProviderDispatchFailed {
                status: status.as_u16(),
                details: body,
            },
            // Timeouts land here too, the provider never answered
            SendEmailError::Transport(_) => ContactError::UnexpectedError(e.into()),
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ContactError::ServiceUnconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ContactError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ContactError::MissingFields => StatusCode::BAD_REQUEST,
            ContactError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ContactError::ProviderDispatchFailed { .. } | ContactError::UnexpectedError(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            ContactError::MethodNotAllowed => {
                response.insert_header((header::ALLOW, HeaderValue::from_static("POST")));
            }
            // Missing and wrong credentials look the same from the outside
            ContactError::Unauthorized(_) => {
                response.insert_header((
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(r#"Basic realm="contact""#),
                ));
            }
            _ => {}
        }

        let body = match self {
            ContactError::ProviderDispatchFailed { status, details } => ErrorBody {
                error: self.to_string(),
                status: Some(*status),
                details: Some(details.as_str()),
            },
            _ => ErrorBody {
                error: self.to_string(),
                status: None,
                details: None,
            },
        };
        response.json(body)
    }
}

#[derive(serde::Serialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(rename = "dryRun", skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

/// Fallback for every method but `POST` on the contact endpoints.
pub async fn method_not_allowed() -> Result<HttpResponse, ContactError> {
    Err(ContactError::MethodNotAllowed)
}

/// Direct contact endpoint: `email` and `message` are required, `name` is optional.
#[tracing::instrument(
    name = "Relay a direct contact message",
    skip(request, body, state),
    fields(sender_email = tracing::field::Empty)
)]
pub async fn contact(
    request: HttpRequest,
    body: web::Payload,
    state: web::Data<RelayState>,
) -> Result<HttpResponse, ContactError> {
    let relay = state.relay().ok_or(ContactError::ServiceUnconfigured)?;

    let raw_body = read_body(body, MAX_BODY_SIZE).await?;
    let payload = parse_payload(&raw_body, content_type(&request));

    // No aliases or envelopes here, only the three top-level keys are read.
    // `Value::get` returns `None` when the payload is not an object at all
    let name = sanitize(payload.get("name"), MAX_FIELD_LENGTH);
    let email = sanitize(payload.get("email"), MAX_FIELD_LENGTH);
    let message = sanitize(payload.get("message"), MAX_MESSAGE_LENGTH);

    if email.is_empty() || message.is_empty() {
        return Err(ContactError::MissingFields);
    }
    tracing::Span::current().record("sender_email", &tracing::field::display(&email));

    let fields = ContactFields {
        name: Some(name.as_str()).filter(|name| !name.is_empty()),
        email: &email,
        message: &message,
        extras: BTreeMap::new(),
    };
    send_contact_email(relay, &fields, MessageLayout::PreLine).await?;

    // `dryRun` is only reported when it is set, the webhook always reports it
    Ok(HttpResponse::Ok().json(ContactResponse {
        success: true,
        dry_run: relay.mailer.is_dry_run().then(|| true),
    }))
}

/// Builds the email and hands it over to the mailer, exactly once.
pub async fn send_contact_email(
    relay: &ContactRelay,
    fields: &ContactFields<'_>,
    layout: MessageLayout,
) -> Result<(), ContactError> {
    let email = RelayRequest::compose(
        &relay.recipients,
        &relay.sender,
        relay.subject_prefix.as_deref(),
        fields,
        layout,
    );
    relay.mailer.dispatch(&email).await?;
    Ok(())
}

/// Only strings count; they are trimmed and cut down to `max` graphemes.
fn sanitize(value: Option<&Value>, max: usize) -> String {
    match value {
        Some(Value::String(text)) => text.trim().graphemes(true).take(max).collect(),
        _ => String::new(),
    }
}
