//! Owned message types and builder.

use super::{BodyKind, FieldValue, MailMessage, MimeEntity};

/// A leaf body part with a declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub content_type: String,
    pub content: String,
}

impl Part {
    pub fn new(content_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self::new("text/html; charset=UTF-8", content)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new("text/plain; charset=UTF-8", content)
    }
}

impl MimeEntity for Part {
    fn content_type(&self) -> Option<&str> {
        Some(&self.content_type)
    }

    fn decoded(&self) -> Option<String> {
        Some(self.content.clone())
    }
}

/// An outgoing message as a host mailer would hand it over.
///
/// Multipart messages carry their bodies in `parts`; single-part messages may
/// instead declare a top-level `content_type` and `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub to: Vec<String>,
    pub from: Vec<String>,
    pub subject: Option<String>,
    pub content_type: Option<String>,
    pub content: Option<String>,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    fn find_part(&self, kind: BodyKind) -> Option<&dyn MimeEntity> {
        self.parts
            .iter()
            .find(|part| kind.matches(&part.content_type))
            .map(|part| part as &dyn MimeEntity)
    }
}

fn field(values: &[String]) -> FieldValue {
    if values.is_empty() {
        FieldValue::Absent
    } else {
        FieldValue::Many(values.to_vec())
    }
}

impl MimeEntity for Message {
    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn decoded(&self) -> Option<String> {
        self.content.clone()
    }

    fn body(&self) -> Option<&dyn MimeEntity> {
        match self.parts.as_slice() {
            [only] => Some(only as &dyn MimeEntity),
            _ => None,
        }
    }
}

impl MailMessage for Message {
    fn to(&self) -> FieldValue {
        field(&self.to)
    }

    fn from(&self) -> FieldValue {
        field(&self.from)
    }

    fn subject(&self) -> FieldValue {
        self.subject.clone().into()
    }

    fn html_part(&self) -> Option<&dyn MimeEntity> {
        self.find_part(BodyKind::Html)
    }

    fn text_part(&self) -> Option<&dyn MimeEntity> {
        self.find_part(BodyKind::Text)
    }
}

/// Builder for [`Message`].
///
/// No field is mandatory here; the delivery pipeline reports what is missing.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    /// Add a recipient candidate.
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.message.to.push(address.into());
        self
    }

    /// Add several recipient candidates.
    pub fn to_many(mut self, addresses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.message.to.extend(addresses.into_iter().map(Into::into));
        self
    }

    /// Add a sender candidate.
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.message.from.push(address.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.message.subject = Some(subject.into());
        self
    }

    /// Add a `text/html` part.
    pub fn html(self, html: impl Into<String>) -> Self {
        self.part(Part::html(html))
    }

    /// Add a `text/plain` part.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.part(Part::text(text))
    }

    pub fn part(mut self, part: Part) -> Self {
        self.message.parts.push(part);
        self
    }

    /// Declare the top-level content type of a single-part message.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.message.content_type = Some(content_type.into());
        self
    }

    /// Top-level decoded content of a single-part message.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.message.content = Some(content.into());
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}
