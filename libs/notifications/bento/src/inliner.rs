//! Best-effort CSS inlining.
//!
//! Some host framework versions hand over HTML that still relies on `<style>`
//! blocks, which many mail clients drop. For those hosts the HTML body is run
//! through a CSS inliner before dispatch. The engine is loaded at most once and
//! the outcome, success or failure, is cached. A failing transform never fails
//! the delivery: the original HTML is sent instead.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use tracing::warn;

use crate::error::DeliveryResult;

/// Host versions from this one on require inlined CSS.
pub const MINIMUM_INLINING_VERSION: FrameworkVersion = FrameworkVersion::new(7, 0, 0);

/// Version of the host framework, as reported by the host.
///
/// A prerelease (`7.0.0.rc1`, `7.0.0-beta`) ranks below the release it precedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameworkVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: bool,
}

impl FrameworkVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: false,
        }
    }

    pub const fn prerelease(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            prerelease: true,
            ..Self::new(major, minor, patch)
        }
    }

    pub fn requires_inlining(&self) -> bool {
        *self >= MINIMUM_INLINING_VERSION
    }
}

impl Ord for FrameworkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| other.prerelease.cmp(&self.prerelease))
    }
}

impl PartialOrd for FrameworkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.prerelease {
            write!(f, ".pre")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid framework version: {0:?}")]
pub struct ParseVersionError(String);

impl FromStr for FrameworkVersion {
    type Err = ParseVersionError;

    /// Accepts `7`, `7.1`, `7.1.3`. Numbering stops at the first non-numeric
    /// segment; any letter in the input marks a prerelease.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let numbers: Vec<u64> = s
            .split('.')
            .map_while(|segment| segment.parse().ok())
            .take(3)
            .collect();

        let version = match numbers.as_slice() {
            [] => return Err(ParseVersionError(s.to_string())),
            [major] => Self::new(*major, 0, 0),
            [major, minor] => Self::new(*major, *minor, 0),
            [major, minor, patch, ..] => Self::new(*major, *minor, *patch),
        };

        Ok(Self {
            prerelease: s.chars().any(|c| c.is_ascii_alphabetic()),
            ..version
        })
    }
}

/// An HTML transform that moves `<style>` rules into `style` attributes.
pub trait CssTransform: Send + Sync {
    fn transform(&self, html: &str) -> Result<String, String>;
}

type Loader = Box<dyn Fn() -> DeliveryResult<Arc<dyn CssTransform>> + Send + Sync>;

/// Inlines CSS when the host requires it, and only then.
pub struct HtmlInliner {
    required: bool,
    loader: Loader,
    engine: OnceLock<DeliveryResult<Arc<dyn CssTransform>>>,
}

impl HtmlInliner {
    /// Never inlines.
    pub fn disabled() -> Self {
        Self::with_loader(false, load_engine)
    }

    /// Inlines when the host version is known and at least 7.0.
    pub fn for_host(version: Option<FrameworkVersion>) -> Self {
        let required = version.is_some_and(|v| v.requires_inlining());
        Self::with_loader(required, load_engine)
    }

    /// Custom engine loader, called at most once on first use.
    pub fn with_loader<F>(required: bool, loader: F) -> Self
    where
        F: Fn() -> DeliveryResult<Arc<dyn CssTransform>> + Send + Sync + 'static,
    {
        Self {
            required,
            loader: Box::new(loader),
            engine: OnceLock::new(),
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Inline the CSS of `html`.
    ///
    /// Returns `html` untouched when inlining is not required or the transform
    /// fails. Fails only when the engine itself cannot be loaded.
    pub fn inline(&self, html: &str) -> DeliveryResult<String> {
        if !self.required {
            return Ok(html.to_string());
        }

        let engine = self
            .engine
            .get_or_init(|| (self.loader)())
            .as_ref()
            .map_err(Clone::clone)?;

        match engine.transform(html) {
            Ok(inlined) => Ok(inlined),
            Err(reason) => {
                warn!(error = %reason, "CSS inlining failed, sending original HTML");
                Ok(html.to_string())
            }
        }
    }
}

impl fmt::Debug for HtmlInliner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlInliner")
            .field("required", &self.required)
            .field("loaded", &self.engine.get().map(Result::is_ok))
            .finish()
    }
}

impl Default for HtmlInliner {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(feature = "inline-css")]
fn load_engine() -> DeliveryResult<Arc<dyn CssTransform>> {
    Ok(Arc::new(engine::CssInlineEngine))
}

#[cfg(not(feature = "inline-css"))]
fn load_engine() -> DeliveryResult<Arc<dyn CssTransform>> {
    Err(crate::error::DeliveryError::dependency(
        "css-inline",
        "css-inline is required when the host framework is 7.0 or higher. \
         Enable the `inline-css` feature of bento_mailer.",
        "bento_mailer was built without the `inline-css` feature",
    ))
}

#[cfg(feature = "inline-css")]
mod engine {
    use css_inline::CSSInliner;

    use super::CssTransform;

    /// `css-inline` with `<style>` blocks inlined and kept, no remote stylesheets.
    pub(super) struct CssInlineEngine;

    impl CssTransform for CssInlineEngine {
        fn transform(&self, html: &str) -> Result<String, String> {
            let inliner = CSSInliner::options()
                .inline_style_tags(true)
                .keep_style_tags(true)
                .load_remote_stylesheets(false)
                .build();
            inliner.inline(html).map_err(|e| e.to_string())
        }
    }
}
