use actix_web::{web, HttpRequest, HttpResponse};

use crate::authentication::{basic_authentication, validate_credentials};
use crate::domain::{ContactFields, MessageLayout, Submission};
use crate::relay::RelayState;
use crate::routes::{
    content_type, parse_payload, read_body, send_contact_email, ContactError, ContactResponse,
    MAX_BODY_SIZE,
};

/// Webhook relay for form backends: tolerant of envelopes and key aliases,
/// requires `name`, `email` and `message`.
#[tracing::instrument(
    name = "Relay a form submission",
    skip(request, body, state),
    fields(sender_email = tracing::field::Empty, sender_name = tracing::field::Empty)
)]
pub async fn relay_submission(
    request: HttpRequest,
    body: web::Payload,
    state: web::Data<RelayState>,
) -> Result<HttpResponse, ContactError> {
    // Checked before touching the body, an unconfigured relay can't send anything anyway
    let relay = state.relay().ok_or(ContactError::ServiceUnconfigured)?;

    let raw_body = read_body(body, MAX_BODY_SIZE).await?;
    let payload = parse_payload(&raw_body, content_type(&request));
    let submission = Submission::from_body(&payload);

    let (name, email, message) = match (
        submission.name.as_deref(),
        submission.email.as_deref(),
        submission.message.as_deref(),
    ) {
        (Some(name), Some(email), Some(message)) => (name, email, message),
        _ => return Err(ContactError::MissingFields),
    };
    tracing::Span::current()
        .record("sender_email", &tracing::field::display(email))
        .record("sender_name", &tracing::field::display(name));

    // Fields are validated before credentials are looked at: a malformed
    // submission is a 400 whether or not the caller is authenticated.
    // Basic auth is only enforced when both username and password are configured,
    // missing header, wrong scheme and wrong credentials all end up as the same 401.
    if let Some(expected) = &relay.basic_auth {
        let credentials =
            basic_authentication(request.headers()).map_err(ContactError::Unauthorized)?;
        validate_credentials(&credentials, expected)
            .map_err(|e| ContactError::Unauthorized(e.into()))?;
    }

    let fields = ContactFields {
        name: Some(name),
        email,
        message,
        extras: submission.extras(),
    };
    send_contact_email(relay, &fields, MessageLayout::LineBreaks).await?;

    Ok(HttpResponse::Ok().json(ContactResponse {
        success: true,
        dry_run: Some(relay.mailer.is_dry_run()),
    }))
}
