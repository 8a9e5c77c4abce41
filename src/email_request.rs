use crate::domain::RelayRequest;

/// Body of `POST /emails` on the Resend API.
#[derive(serde::Serialize)]
pub struct SendEmailRequest<'a> {
    pub from: &'a str,
    pub to: &'a [String],
    pub subject: &'a str,
    pub html: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<&'a str>,
}

impl<'a> From<&'a RelayRequest> for SendEmailRequest<'a> {
    fn from(email: &'a RelayRequest) -> Self {
        Self {
            from: &email.sender,
            to: &email.recipients,
            subject: &email.subject,
            html: &email.html_body,
            text: &email.text_body,
            reply_to: email.reply_to.as_deref(),
        }
    }
}
