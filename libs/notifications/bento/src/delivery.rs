//! The Bento delivery method.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::dispatch::{self, OutgoingEmail};
use crate::error::{DeliveryError, DeliveryResult};
use crate::inliner::HtmlInliner;
use crate::message::MailMessage;
use crate::pipeline::{DeliveryContext, Pipeline};
use crate::settings::Settings;
use crate::transport::{ApiResponse, HttpTransport, ReqwestTransport};

/// Name under which the Bento strategy is registered.
pub const DELIVERY_METHOD_NAME: &str = "bento";

/// A named strategy the host uses to send its messages.
#[async_trait]
pub trait DeliveryMethod: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, message: &dyn MailMessage) -> DeliveryResult<ApiResponse>;
}

/// Delivers messages through the Bento batch email API.
///
/// Settings are checked when a message is sent, not on construction, and may
/// be changed between deliveries through [`settings_mut`](Self::settings_mut).
pub struct BentoDelivery {
    settings: Settings,
    transport: Arc<dyn HttpTransport>,
    inliner: HtmlInliner,
    pipeline: Pipeline,
}

impl BentoDelivery {
    /// Deliver over HTTPS with CSS inlining disabled.
    pub fn new(settings: Settings) -> Self {
        Self::with_transport(settings, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(settings: Settings, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            settings,
            transport,
            inliner: HtmlInliner::disabled(),
            pipeline: Pipeline::standard(),
        }
    }

    pub fn with_inliner(mut self, inliner: HtmlInliner) -> Self {
        self.inliner = inliner;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Deliver `message` with an empty personalization map.
    pub async fn deliver(&self, message: &dyn MailMessage) -> DeliveryResult<ApiResponse> {
        self.deliver_with(message, Map::new()).await
    }

    /// Deliver `message` with personalization values for the remote template.
    pub async fn deliver_with(
        &self,
        message: &dyn MailMessage,
        personalization: Map<String, Value>,
    ) -> DeliveryResult<ApiResponse> {
        let mut ctx = DeliveryContext::new(Some(message)).with_personalization(personalization);
        self.run(&mut ctx).await?;
        ctx.result
            .take()
            .ok_or_else(|| DeliveryError::validation("Delivery finished without a response"))
    }

    /// Run the pipeline over a prepared context.
    #[instrument(skip_all, fields(transport = self.transport.name()))]
    pub async fn run(&self, ctx: &mut DeliveryContext<'_>) -> DeliveryResult<()> {
        self.pipeline.run(self, ctx).await?;
        if let Some(response) = &ctx.result {
            info!(status = response.status, to = ?ctx.to, "Email delivered");
        }
        Ok(())
    }

    /// Send an already extracted email.
    pub async fn send_mail(
        &self,
        email: &OutgoingEmail,
        personalization: &Map<String, Value>,
    ) -> DeliveryResult<ApiResponse> {
        dispatch::dispatch(self.transport.as_ref(), &self.settings, email, personalization).await
    }

    /// Inline CSS into `html` when the host requires it.
    pub fn inline_html(&self, html: &str) -> DeliveryResult<String> {
        self.inliner.inline(html)
    }
}

impl std::fmt::Debug for BentoDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BentoDelivery")
            .field("settings", &self.settings)
            .field("transport", &self.transport.name())
            .field("inliner", &self.inliner)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

#[async_trait]
impl DeliveryMethod for BentoDelivery {
    fn name(&self) -> &'static str {
        DELIVERY_METHOD_NAME
    }

    async fn deliver(&self, message: &dyn MailMessage) -> DeliveryResult<ApiResponse> {
        BentoDelivery::deliver(self, message).await
    }
}
