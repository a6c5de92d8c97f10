//! Delivery pipeline.
//!
//! A delivery is a fixed chain of steps sharing one [`DeliveryContext`]. Each
//! step reads and fills context fields; the first failing step ends the run
//! and its error is returned to the caller. Later steps never run after a
//! failure, which fixes the precedence of validation errors.

mod steps;

pub use steps::{Dispatch, EnsureMessage, ExtractAddresses, ExtractBodies, ExtractSubject};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::delivery::BentoDelivery;
use crate::dispatch::OutgoingEmail;
use crate::error::{DeliveryError, DeliveryResult};
use crate::message::MailMessage;
use crate::transport::ApiResponse;

/// Per-call state, created fresh for each delivery.
#[derive(Default)]
pub struct DeliveryContext<'a> {
    pub mail: Option<&'a dyn MailMessage>,
    pub to: Option<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub html_body: Option<String>,
    pub text_body: Option<String>,
    pub personalization: Map<String, Value>,
    pub result: Option<ApiResponse>,
}

impl<'a> DeliveryContext<'a> {
    pub fn new(mail: Option<&'a dyn MailMessage>) -> Self {
        Self {
            mail,
            ..Default::default()
        }
    }

    pub fn with_personalization(mut self, personalization: Map<String, Value>) -> Self {
        self.personalization = personalization;
        self
    }

    /// The extracted email, once every field has been filled.
    pub fn outgoing(&self) -> DeliveryResult<OutgoingEmail> {
        fn field(value: &Option<String>, missing: &str) -> DeliveryResult<String> {
            value
                .clone()
                .ok_or_else(|| DeliveryError::validation(missing))
        }

        Ok(OutgoingEmail {
            to: field(&self.to, "Mail to address is required")?,
            from: field(&self.from, "Mail from address is required")?,
            subject: field(&self.subject, "Mail subject is required")?,
            html_body: field(&self.html_body, steps::MISSING_HTML_BODY)?,
            text_body: self.text_body.clone(),
        })
    }
}

impl std::fmt::Debug for DeliveryContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryContext")
            .field("mail", &self.mail.is_some())
            .field("to", &self.to)
            .field("from", &self.from)
            .field("subject", &self.subject)
            .field("html_body", &self.html_body.as_ref().map(String::len))
            .field("text_body", &self.text_body.as_ref().map(String::len))
            .field("personalization", &self.personalization)
            .field("result", &self.result)
            .finish()
    }
}

/// One stage of a delivery.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn call(&self, delivery: &BentoDelivery, ctx: &mut DeliveryContext<'_>) -> DeliveryResult<()>;
}

/// Ordered list of steps.
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    /// Validate, extract addresses, subject and bodies, then dispatch.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Box::new(EnsureMessage),
                Box::new(ExtractAddresses),
                Box::new(ExtractSubject),
                Box::new(ExtractBodies),
                Box::new(Dispatch),
            ],
        }
    }

    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step in order, stopping at the first error.
    pub async fn run(&self, delivery: &BentoDelivery, ctx: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
        for step in &self.steps {
            debug!(step = step.name(), "Running delivery step");
            step.call(delivery, ctx).await?;
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::settings::Settings;
    use crate::transport::RecordingTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Step for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn call(&self, _: &BentoDelivery, _: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Step for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn call(&self, _: &BentoDelivery, _: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
            Err(DeliveryError::validation("stop"))
        }
    }

    fn delivery() -> BentoDelivery {
        BentoDelivery::with_transport(Settings::new(), Arc::new(RecordingTransport::new()))
    }

    #[test]
    fn test_standard_step_order() {
        assert_eq!(
            Pipeline::standard().step_names(),
            vec![
                "ensure_message",
                "extract_addresses",
                "extract_subject",
                "extract_bodies",
                "dispatch"
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_later_steps() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![
            Box::new(Counting(calls.clone())),
            Box::new(Failing),
            Box::new(Counting(calls.clone())),
        ]);
        let mut ctx = DeliveryContext::new(None);

        let err = pipeline.run(&delivery(), &mut ctx).await.unwrap_err();

        assert_eq!(err.message(), "stop");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_message_is_reported_first() {
        let mut ctx = DeliveryContext::new(None);

        let err = Pipeline::standard().run(&delivery(), &mut ctx).await.unwrap_err();

        assert_eq!(err.message(), "Mail message is required");
        assert!(ctx.to.is_none());
    }

    #[test]
    fn test_outgoing_requires_extracted_fields() {
        let message = Message::builder().build();
        let mut ctx = DeliveryContext::new(Some(&message));
        ctx.to = Some("a@x.com".to_string());

        let err = ctx.outgoing().unwrap_err();
        assert_eq!(err.message(), "Mail from address is required");
    }
}
