use std::collections::BTreeMap;

use serde_json::Value;

/// Sub-objects of the body that form builders wrap the real fields in.
/// Later envelopes overwrite earlier ones.
const ENVELOPE_KEYS: [&str; 5] = ["data", "payload", "fields", "submission", "context"];

const NAME_ALIASES: [&str; 5] = ["name", "full_name", "fullName", "senderName", "from_name"];
const EMAIL_ALIASES: [&str; 5] = ["email", "senderEmail", "from", "from_email", "reply_to"];
const MESSAGE_ALIASES: [&str; 5] = ["message", "body", "content", "text", "notes"];

/// Keys of form-builder entries holding the value, by priority.
const ENTRY_VALUE_KEYS: [&str; 3] = ["value", "text", "content"];

const CANONICAL_KEYS: [&str; 3] = ["name", "email", "message"];

/// A contact form submission flattened out of an arbitrarily shaped body.
///
/// `fields` holds every key that was found, the alias keys included.
/// `name`, `email` and `message` are the trimmed values picked through the
/// alias lists, `None` when no alias carries a non-blank value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Submission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl Submission {
    /// Never fails: unusable parts of the body simply contribute no fields.
    pub fn from_body(body: &Value) -> Self {
        let mut fields = BTreeMap::new();
        // The body itself comes first, then `data`, `payload`, `fields`,
        // `submission` and `context` in that fixed order. `extend` overwrites
        // on collision, so a key set in a later envelope wins over the same
        // key set earlier, whatever the order in the incoming JSON.
        for envelope in envelopes(body) {
            fields.extend(flatten(envelope, true));
        }

        // Alias lookup runs on the merged map: the first alias with a
        // non-blank value wins, e.g. `from_name` beats an empty `name`.

        Self {
            name: pick_field(&fields, &NAME_ALIASES),
            email: pick_field(&fields, &EMAIL_ALIASES),
            message: pick_field(&fields, &MESSAGE_ALIASES),
            fields,
        }
    }

    /// Every field except the canonical `name`, `email` and `message` keys.
    pub fn extras(&self) -> BTreeMap<&str, &str> {
        self.fields
            .iter()
            .filter(|(key, _)| !CANONICAL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }
}

fn envelopes(body: &Value) -> impl Iterator<Item = &Value> {
    // `Value::get` yields `None` for anything that is not an object
    std::iter::once(body).chain(ENVELOPE_KEYS.into_iter().filter_map(move |key| body.get(key)))
}

/// Coerces one envelope into a flat `key -> text` mapping.
///
/// A string envelope gets a single JSON parse attempt; the parsed value is
/// flattened without parsing again.
fn flatten(envelope: &Value, parse_strings: bool) -> BTreeMap<String, String> {
    match envelope {
        Value::String(raw) if parse_strings => serde_json::from_str::<Value>(raw)
            .map(|parsed| flatten(&parsed, false))
            .unwrap_or_default(),
        Value::Array(entries) => entries.iter().filter_map(entry_pair).collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| as_text(value).map(|text| (key.clone(), text)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// `{"name": "email", "value": "a@b.c"}` style entry.
fn entry_pair(entry: &Value) -> Option<(String, String)> {
    let key = match entry.get("name")? {
        Value::String(name) if !name.is_empty() => name.clone(),
        Value::Number(name) => name.to_string(),
        _ => return None,
    };
    let value = ENTRY_VALUE_KEYS
        .iter()
        .filter_map(|candidate| entry.get(*candidate))
        .find(|value| !value.is_null())?;

    as_text(value).map(|text| (key, text))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        nested => Some(nested.to_string()),
    }
}

fn pick_field(fields: &BTreeMap<String, String>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| fields.get(*alias))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_owned)
}
