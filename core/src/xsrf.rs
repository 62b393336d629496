//! XSRF token header injection.
//!
//! # Design
//! The page origin and cookie jar are injected through `Environment` instead
//! of being read from ambient state, so the gating rules can be exercised
//! with fixed values.

use std::collections::HashMap;

use tracing::trace;

use crate::config::{Headers, RequestDescriptor};
use crate::cookie::CookieStore;
use crate::origin::{is_url_same_origin, OriginProvider};

/// Capabilities the controller reads from the hosting context.
pub struct Environment {
    origin: Option<Box<dyn OriginProvider + Send + Sync>>,
    cookies: Box<dyn CookieStore + Send + Sync>,
}

impl Environment {
    pub fn new(
        origin: impl OriginProvider + Send + Sync + 'static,
        cookies: impl CookieStore + Send + Sync + 'static,
    ) -> Self {
        Self {
            origin: Some(Box::new(origin)),
            cookies: Box::new(cookies),
        }
    }

    /// No page and no cookies: nothing is same-origin and no token is ever
    /// found.
    pub fn detached() -> Self {
        Self {
            origin: None,
            cookies: Box::new(HashMap::<String, String>::new()),
        }
    }

    pub fn is_same_origin(&self, url: &str) -> bool {
        match &self.origin {
            Some(origin) => is_url_same_origin(url, origin.as_ref()),
            None => false,
        }
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detached()
    }
}

/// Copy the XSRF cookie into the configured header when the request is
/// credentialed or same-origin. Returns whether a header was set.
///
/// Empty cookie values count as absent. Other headers are never touched.
pub fn inject_xsrf_header(
    config: &RequestDescriptor,
    headers: &mut Headers,
    env: &Environment,
) -> bool {
    let Some(cookie_name) = config.xsrf_cookie_name.as_deref() else {
        return false;
    };
    let credentialed = config.with_credentials.unwrap_or(false);
    if !credentialed && !env.is_same_origin(&config.url) {
        return false;
    }
    let Some(value) = env.cookie(cookie_name).filter(|v| !v.is_empty()) else {
        return false;
    };
    let Some(header_name) = config.xsrf_header_name.as_deref() else {
        return false;
    };
    trace!(header = header_name, "injecting xsrf header");
    headers.insert(header_name.to_string(), value);
    true
}
