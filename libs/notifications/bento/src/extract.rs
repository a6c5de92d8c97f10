//! Field and body extraction from inbound messages.

use crate::error::{DeliveryError, DeliveryResult};
use crate::message::{BodyKind, FieldValue, MailMessage, MimeEntity};

/// Strip leading and trailing ASCII whitespace and NUL. Other Unicode
/// whitespace (NBSP, ideographic space) is content.
pub fn strip(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0')
}

/// First candidate whose stripped form is non-empty, stripped.
pub fn extract_address(field: &FieldValue, name: &str) -> DeliveryResult<String> {
    field
        .candidates()
        .map(strip)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DeliveryError::validation(format!("Mail {} address is required", name)))
}

/// First non-blank subject candidate, returned untrimmed.
pub fn extract_subject(field: &FieldValue) -> DeliveryResult<String> {
    field
        .candidates()
        .find(|value| !strip(value).is_empty())
        .map(str::to_string)
        .ok_or_else(|| DeliveryError::validation("Mail subject is required"))
}

/// Locates the HTML and plain-text bodies of a message.
///
/// Resolution order per body kind: the message's named part accessor, then the
/// message itself when its declared type matches, then its single nested body.
pub struct BodyExtractor<'m> {
    message: &'m dyn MailMessage,
}

impl<'m> BodyExtractor<'m> {
    pub fn new(message: &'m dyn MailMessage) -> Self {
        Self { message }
    }

    pub fn html_body(&self) -> Option<String> {
        self.extract(BodyKind::Html)
    }

    pub fn text_body(&self) -> Option<String> {
        self.extract(BodyKind::Text)
    }

    fn extract(&self, kind: BodyKind) -> Option<String> {
        let entity = self
            .named_part(kind)
            .or_else(|| self.fallback_part(kind))?;
        decoded(entity)
    }

    fn named_part(&self, kind: BodyKind) -> Option<&'m dyn MimeEntity> {
        match kind {
            BodyKind::Html => self.message.html_part(),
            BodyKind::Text => self.message.text_part(),
        }
    }

    fn fallback_part(&self, kind: BodyKind) -> Option<&'m dyn MimeEntity> {
        let message: &'m dyn MimeEntity = self.message;
        if declares(message, kind) {
            return Some(message);
        }

        message.body().filter(|body| declares(*body, kind))
    }
}

fn declares(entity: &dyn MimeEntity, kind: BodyKind) -> bool {
    entity.content_type().is_some_and(|ct| kind.matches(ct))
}

fn decoded(entity: &dyn MimeEntity) -> Option<String> {
    entity
        .decoded()
        .or_else(|| entity.body().and_then(|body| body.decoded()))
}
