use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use subtle::ConstantTimeEq;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid Credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

/// Extracts `Basic` credentials out of the `Authorization` header.
///
/// The password is everything after the first `:` of the decoded value.
pub fn basic_authentication(headers: &HeaderMap) -> Result<Credentials, anyhow::Error> {
    let header_value = headers
        .get(AUTHORIZATION)
        .context("The 'Authorization' header was not found")?
        .to_str()
        .context("The 'Authorization' header was not a valid UTF8 string")?;

    let base64_encoded_segment = header_value
        .strip_prefix("Basic ")
        .context("The authorization scheme was not 'Basic'")?;
    let decoded_bytes = base64::decode_config(base64_encoded_segment, base64::STANDARD)
        .context("Failed to decode base64 'Basic' credentials")?;
    let decoded_credentials = String::from_utf8(decoded_bytes)
        .context("The decoded credential string is not valid UTF8")?;

    let (username, password) = decoded_credentials
        .split_once(':')
        .context("A username and a password must be provided in 'Basic' auth.")?;

    Ok(Credentials {
        username: username.to_string(),
        password: Secret::new(password.to_string()),
    })
}

/// Compares the submitted credentials with the configured ones.
///
/// Both fields are always compared, in constant time, so a wrong username
/// takes as long to reject as a wrong password.
#[tracing::instrument(name = "Validate credentials", skip(candidate, expected))]
pub fn validate_credentials(
    candidate: &Credentials,
    expected: &Credentials,
) -> Result<(), AuthError> {
    // `&` and not `&&`: no short-circuit on the username
    let username_matches = candidate
        .username
        .as_bytes()
        .ct_eq(expected.username.as_bytes());
    let password_matches = candidate
        .password
        .expose_secret()
        .as_bytes()
        .ct_eq(expected.password.expose_secret().as_bytes());

    if bool::from(username_matches & password_matches) {
        Ok(())
    } else {
        // Which of the two was wrong stays out of the response and the logs
        Err(AuthError::InvalidCredentials(anyhow::anyhow!(
            "Invalid username or password"
        )))
    }
}
