//! Bento email delivery for mailer hosts
//!
//! Delivers one outgoing message at a time through the Bento batch email API.
//! A message is validated, its addresses, subject and bodies are extracted,
//! the HTML body is optionally CSS-inlined, and the result is posted as a
//! batch of one.
//!
//! ## Features
//!
//! - `inline-css` (default) - CSS inlining via `css-inline` for hosts on 7.0+
//!
//! ## Components
//!
//! - **Delivery**: `BentoDelivery`, the `DeliveryMethod` strategy, `Pipeline` and its steps
//! - **Messages**: `MailMessage` with an owned `Message` and a `mailparse::ParsedMail` adapter
//! - **Settings**: `Settings`, loadable from `BENTO_*` environment variables
//! - **Transport**: `HttpTransport` with `ReqwestTransport` and `RecordingTransport`
//! - **Registration**: `DeliveryMethods` and `register`
//!
//! ## Usage
//!
//! ```ignore
//! use bento_mailer::{BentoDelivery, Message, Settings};
//! use core_config::FromEnv;
//!
//! let delivery = BentoDelivery::new(Settings::from_env()?);
//! let message = Message::builder()
//!     .to("a@example.com")
//!     .from("b@example.com")
//!     .subject("Hi")
//!     .html("<p>hi</p>")
//!     .build();
//! delivery.deliver(&message).await?;
//! ```

pub mod delivery;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod inliner;
pub mod message;
pub mod pipeline;
pub mod registry;
pub mod response;
pub mod settings;
pub mod transport;

pub use delivery::{BentoDelivery, DeliveryMethod, DELIVERY_METHOD_NAME};
pub use dispatch::{OutgoingEmail, BENTO_ENDPOINT};
pub use error::{DeliveryError, DeliveryErrorKind, DeliveryResult};
pub use inliner::{CssTransform, FrameworkVersion, HtmlInliner};
pub use message::{FieldValue, MailMessage, Message, MessageBuilder, MimeEntity, Part};
pub use pipeline::{DeliveryContext, Pipeline, Step};
pub use registry::{register, DeliveryMethods, HostContext, RegistryError};
pub use settings::{Settings, SettingsError};

pub use transport::{ApiRequest, ApiResponse, HttpTransport, RecordingTransport, ReqwestTransport, TransportError};
