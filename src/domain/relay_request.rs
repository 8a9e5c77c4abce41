use std::collections::BTreeMap;

use htmlescape::encode_minimal;
use serde_json::Value;

const NOT_PROVIDED: &str = "(not provided)";

/// Validated fields of a contact message.
pub struct ContactFields<'a> {
    pub name: Option<&'a str>,
    pub email: &'a str,
    pub message: &'a str,
    /// Fields beyond the three core ones, dumped as JSON into the email.
    pub extras: BTreeMap<&'a str, &'a str>,
}

/// How newlines of the message are rendered in the HTML body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageLayout {
    /// Newlines kept as-is, rendered through `white-space: pre-line`.
    PreLine,
    /// Newlines replaced with `<br/>`.
    LineBreaks,
}

/// A contact message ready to be handed over to the email provider.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub recipients: Vec<String>,
    pub sender: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub reply_to: Option<String>,
}

impl RelayRequest {
    pub fn compose(
        recipients: &[String],
        sender: &str,
        subject_prefix: Option<&str>,
        fields: &ContactFields,
        layout: MessageLayout,
    ) -> Self {
        let extras = extras_json(&fields.extras);
        Self {
            recipients: recipients.to_vec(),
            sender: sender.to_owned(),
            subject: subject_line(fields.name, subject_prefix),
            html_body: html_body(fields, layout, extras.as_deref()),
            text_body: text_body(fields, extras.as_deref()),
            reply_to: Some(fields.email.to_owned()).filter(|email| !email.is_empty()),
        }
    }
}

pub fn subject_line(name: Option<&str>, prefix: Option<&str>) -> String {
    let base = match name {
        Some(name) if !name.is_empty() => format!("New contact from {}", name),
        _ => "New contact message".to_string(),
    };
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{} {}", prefix, base),
        _ => base,
    }
}

fn extras_json(extras: &BTreeMap<&str, &str>) -> Option<String> {
    if extras.is_empty() {
        return None;
    }
    let object: serde_json::Map<String, Value> = extras
        .iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect();
    // `{:#}` is serde_json's pretty printer
    Some(format!("{:#}", Value::Object(object)))
}

fn html_body(fields: &ContactFields, layout: MessageLayout, extras: Option<&str>) -> String {
    let name = encode_minimal(fields.name.unwrap_or(NOT_PROVIDED));
    let email = encode_minimal(fields.email);
    let message = encode_minimal(fields.message);

    let message = match layout {
        MessageLayout::PreLine => format!(r#"<p style="white-space: pre-line;">{}</p>"#, message),
        MessageLayout::LineBreaks => format!("<p>{}</p>", message.replace('\n', "<br/>")),
    };

    let mut html = format!(
        "<p><strong>Name:</strong> {}</p>\n\
         <p><strong>Email:</strong> {}</p>\n\
         <p><strong>Message:</strong></p>\n\
         {}\n",
        name, email, message
    );
    if let Some(extras) = extras {
        html.push_str(&format!(
            "<hr />\n<p><strong>Extra fields:</strong></p>\n<pre>{}</pre>\n",
            encode_minimal(extras)
        ));
    }
    html
}

fn text_body(fields: &ContactFields, extras: Option<&str>) -> String {
    let mut text = format!(
        "Name: {}\nEmail: {}\n\n{}",
        fields.name.unwrap_or(NOT_PROVIDED),
        fields.email,
        fields.message
    );
    if let Some(extras) = extras {
        text.push_str(&format!("\n\nExtra:\n{}", extras));
    }
    text
}
