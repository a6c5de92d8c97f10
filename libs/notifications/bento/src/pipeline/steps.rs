use async_trait::async_trait;
use tracing::debug;

use super::{DeliveryContext, Step};
use crate::delivery::BentoDelivery;
use crate::error::{DeliveryError, DeliveryResult};
use crate::extract::{extract_address, extract_subject, BodyExtractor};
use crate::message::MailMessage;

pub(super) const MISSING_HTML_BODY: &str = "No HTML body given. Bento requires an html email body.";

fn message<'a>(ctx: &DeliveryContext<'a>) -> DeliveryResult<&'a dyn MailMessage> {
    ctx.mail
        .ok_or_else(|| DeliveryError::validation("Mail message is required"))
}

/// Fails when there is no message to deliver.
pub struct EnsureMessage;

#[async_trait]
impl Step for EnsureMessage {
    fn name(&self) -> &'static str {
        "ensure_message"
    }

    async fn call(&self, _: &BentoDelivery, ctx: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
        message(ctx).map(|_| ())
    }
}

/// Resolves `to`, then `from`.
pub struct ExtractAddresses;

#[async_trait]
impl Step for ExtractAddresses {
    fn name(&self) -> &'static str {
        "extract_addresses"
    }

    async fn call(&self, _: &BentoDelivery, ctx: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
        let mail = message(ctx)?;
        ctx.to = Some(extract_address(&mail.to(), "to")?);
        ctx.from = Some(extract_address(&mail.from(), "from")?);
        Ok(())
    }
}

pub struct ExtractSubject;

#[async_trait]
impl Step for ExtractSubject {
    fn name(&self) -> &'static str {
        "extract_subject"
    }

    async fn call(&self, _: &BentoDelivery, ctx: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
        let mail = message(ctx)?;
        ctx.subject = Some(extract_subject(&mail.subject())?);
        Ok(())
    }
}

/// HTML body is mandatory and gets inlined; the text body is optional.
pub struct ExtractBodies;

#[async_trait]
impl Step for ExtractBodies {
    fn name(&self) -> &'static str {
        "extract_bodies"
    }

    async fn call(&self, delivery: &BentoDelivery, ctx: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
        let bodies = BodyExtractor::new(message(ctx)?);

        let html = bodies
            .html_body()
            .ok_or_else(|| DeliveryError::validation(MISSING_HTML_BODY))?;
        ctx.html_body = Some(delivery.inline_html(&html)?);
        ctx.text_body = bodies.text_body();

        debug!(has_text = ctx.text_body.is_some(), "Extracted message bodies");
        Ok(())
    }
}

/// Sends the extracted email and stores the raw response.
pub struct Dispatch;

#[async_trait]
impl Step for Dispatch {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    async fn call(&self, delivery: &BentoDelivery, ctx: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
        let email = ctx.outgoing()?;
        let response = delivery.send_mail(&email, &ctx.personalization).await?;
        ctx.result = Some(response);
        Ok(())
    }
}
