//! Inbound message model.
//!
//! The adapter does not own a MIME representation. It reads messages through
//! two small traits: [`MimeEntity`] for anything with a declared content type
//! and decoded content, and [`MailMessage`] for the addressable top-level
//! message. [`Message`] is an owned implementation; raw RFC 822 messages parsed
//! with `mailparse` implement the traits directly.

mod mime;
mod owned;

pub use owned::{Message, MessageBuilder, Part};

/// A node of a message body: the message itself, a part, or a nested body.
pub trait MimeEntity: Send + Sync {
    /// Declared content type, parameters included (e.g. `text/html; charset=UTF-8`).
    fn content_type(&self) -> Option<&str>;

    /// Transfer-decoded textual content, if this entity carries it directly.
    fn decoded(&self) -> Option<String>;

    /// The single nested body of this entity.
    fn body(&self) -> Option<&dyn MimeEntity> {
        None
    }
}

/// A message handed over by the host's mailer.
pub trait MailMessage: MimeEntity {
    fn to(&self) -> FieldValue;

    fn from(&self) -> FieldValue;

    fn subject(&self) -> FieldValue;

    /// Dedicated HTML part, for messages that can name one.
    fn html_part(&self) -> Option<&dyn MimeEntity> {
        None
    }

    /// Dedicated plain-text part, for messages that can name one.
    fn text_part(&self) -> Option<&dyn MimeEntity> {
        None
    }
}

/// A header field that may be missing, hold one value, or hold several candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldValue {
    #[default]
    Absent,
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// Candidate values in field order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            FieldValue::Absent => &[],
            FieldValue::One(value) => std::slice::from_ref(value),
            FieldValue::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::One(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::One(value)
    }
}

impl<T: Into<String>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Absent, |v| FieldValue::One(v.into()))
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Many(values)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Body categories the adapter looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Html,
    Text,
}

impl BodyKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            BodyKind::Html => "text/html",
            BodyKind::Text => "text/plain",
        }
    }

    /// Whether a declared content type falls in this category.
    ///
    /// Comparison is case-insensitive and ignores parameters after `;`.
    pub fn matches(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        essence.eq_ignore_ascii_case(self.mime_type())
    }
}
