//! Named delivery strategies.
//!
//! Hosts collect their delivery methods in a [`DeliveryMethods`] table while
//! the mailer subsystem starts, then [`finalize`](DeliveryMethods::finalize)
//! it once mailer configuration is applied. Registration is idempotent.
//! Methods are built against the table's [`HostContext`], which carries the
//! host version and the HTTP transport.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::delivery::{BentoDelivery, DeliveryMethod, DELIVERY_METHOD_NAME};
use crate::inliner::{FrameworkVersion, HtmlInliner};
use crate::settings::Settings;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Builds a delivery method from its settings and the host it runs in.
pub type DeliveryFactory = fn(Settings, &HostContext) -> Arc<dyn DeliveryMethod>;

/// What a delivery method learns about its host when it is built.
#[derive(Clone)]
pub struct HostContext {
    /// Host framework version; `None` when the host does not report one.
    pub version: Option<FrameworkVersion>,
    pub transport: Arc<dyn HttpTransport>,
}

impl HostContext {
    pub fn new(version: Option<FrameworkVersion>) -> Self {
        Self {
            version,
            transport: Arc::new(ReqwestTransport::new()),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("version", &self.version)
            .field("transport", &self.transport.name())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Delivery methods are finalized; cannot add {0}")]
    Finalized(String),

    #[error("Unknown delivery method: {0}")]
    Unknown(String),
}

/// Maps delivery method names to factories.
#[derive(Debug, Default)]
pub struct DeliveryMethods {
    factories: BTreeMap<&'static str, DeliveryFactory>,
    host: HostContext,
    finalized: bool,
}

impl DeliveryMethods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose methods are built for `host`.
    pub fn for_host(host: HostContext) -> Self {
        Self {
            host,
            ..Self::default()
        }
    }

    pub fn host(&self) -> &HostContext {
        &self.host
    }

    /// Register `factory` under `name`.
    ///
    /// Returns `Ok(false)` when the name is already taken; the existing entry
    /// is kept.
    pub fn add(&mut self, name: &'static str, factory: DeliveryFactory) -> Result<bool, RegistryError> {
        if self.finalized {
            return Err(RegistryError::Finalized(name.to_string()));
        }
        if self.factories.contains_key(name) {
            debug!(name, "Delivery method already registered");
            return Ok(false);
        }
        self.factories.insert(name, factory);
        debug!(name, "Delivery method registered");
        Ok(true)
    }

    /// Close the table to further registration.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Instantiate the method registered under `name`.
    pub fn build(&self, name: &str, settings: Settings) -> Result<Arc<dyn DeliveryMethod>, RegistryError> {
        self.factories
            .get(name)
            .map(|factory| factory(settings, &self.host))
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }
}

fn bento_factory(settings: Settings, host: &HostContext) -> Arc<dyn DeliveryMethod> {
    Arc::new(
        BentoDelivery::with_transport(settings, host.transport.clone())
            .with_inliner(HtmlInliner::for_host(host.version)),
    )
}

/// Add the `bento` delivery method to `methods`.
pub fn register(methods: &mut DeliveryMethods) -> Result<bool, RegistryError> {
    methods.add(DELIVERY_METHOD_NAME, bento_factory)
}
