//! Same-origin detection.
//!
//! Target URLs are resolved against the current document URL, supplied by an
//! `OriginProvider`, and compared on protocol and host (port included when it
//! is not the scheme default).

use url::Url;

use crate::config::ConfigError;

/// Protocol (with trailing colon, e.g. `https:`) and host (with port when
/// non-default).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub protocol: String,
    pub host: String,
}

impl Origin {
    pub fn of(url: &Url) -> Self {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        Self {
            protocol: format!("{}:", url.scheme()),
            host,
        }
    }
}

/// The execution context requests are made from.
pub trait OriginProvider {
    /// URL relative targets resolve against.
    fn document_url(&self) -> &Url;

    fn origin(&self) -> Origin {
        Origin::of(self.document_url())
    }
}

/// A provider pinned to one page URL.
#[derive(Debug, Clone)]
pub struct FixedOrigin {
    document_url: Url,
}

impl FixedOrigin {
    pub fn new(document_url: Url) -> Self {
        Self { document_url }
    }

    pub fn parse(document_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(document_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: document_url.to_string(),
            source,
        })?;
        Ok(Self::new(parsed))
    }
}

impl OriginProvider for FixedOrigin {
    fn document_url(&self) -> &Url {
        &self.document_url
    }
}

/// Resolve `target` against `base` and return its origin.
pub fn resolve_url(base: &Url, target: &str) -> Result<Origin, url::ParseError> {
    base.join(target).map(|resolved| Origin::of(&resolved))
}

/// Whether `target` has the same protocol and host as the provider's page.
/// Unresolvable targets are never same-origin.
pub fn is_url_same_origin(target: &str, provider: &dyn OriginProvider) -> bool {
    match resolve_url(provider.document_url(), target) {
        Ok(origin) => origin == provider.origin(),
        Err(_) => false,
    }
}
