mod relay_request;
mod submission;

pub use relay_request::{subject_line, ContactFields, MessageLayout, RelayRequest};
pub use submission::Submission;
