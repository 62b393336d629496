//! The request descriptor: everything the controller needs to run one request.
//!
//! # Design
//! `RequestDescriptor` is plain data with serde derives so hosts can hand it
//! over as JSON (`camelCase` keys). The cancel token is attached
//! programmatically and never serialized. Defaults are applied here only for
//! what the transport layer itself needs (`method = "get"`); merging with
//! client-wide defaults happens upstream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::query::{build_url, ParamValue, Params};

/// Header mapping as given by the caller. Keys keep their original case.
pub type Headers = BTreeMap<String, String>;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid request descriptor: {0}")]
    InvalidDescriptor(#[from] serde_json::Error),

    #[error("invalid base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// How the caller wants the response body handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Raw response text, bypassing the transport's typed decoding.
    Text,
    Json,
    ArrayBuffer,
}

/// One request, as described by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub data: Option<String>,

    #[serde(default)]
    pub headers: Headers,

    #[serde(default)]
    pub params: Params,

    #[serde(default)]
    pub response_type: Option<ResponseType>,

    /// Milliseconds; `None` or `Some(0)` disables the timeout.
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(skip)]
    pub cancel_token: Option<CancelToken>,

    #[serde(default)]
    pub with_credentials: Option<bool>,

    #[serde(default)]
    pub xsrf_cookie_name: Option<String>,

    #[serde(default)]
    pub xsrf_header_name: Option<String>,
}

fn default_method() -> String {
    "get".to_string()
}

impl RequestDescriptor {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: default_method(),
            data: None,
            headers: Headers::new(),
            params: Params::default(),
            response_type: None,
            timeout: None,
            cancel_token: None,
            with_credentials: None,
            xsrf_cookie_name: None,
            xsrf_header_name: None,
        }
    }

    /// Parse a descriptor from its JSON form.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.push(key, value);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    pub fn xsrf(mut self, cookie_name: &str, header_name: &str) -> Self {
        self.xsrf_cookie_name = Some(cookie_name.to_string());
        self.xsrf_header_name = Some(header_name.to_string());
        self
    }

    /// Fold `params` into `url`. This is the upstream encoding step; the
    /// controller itself sends `url` as-is.
    pub fn encode_params(mut self) -> Self {
        let params = std::mem::take(&mut self.params);
        self.url = build_url(&self.url, &params);
        self
    }

    /// The timeout to configure on the transport, if any. Zero means none.
    pub(crate) fn effective_timeout(&self) -> Option<u64> {
        self.timeout.filter(|ms| *ms > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_applies_defaults() {
        let config = RequestDescriptor::from_json(r#"{"url":"/api/items"}"#).unwrap();
        assert_eq!(config.url, "/api/items");
        assert_eq!(config.method, "get");
        assert!(config.data.is_none());
        assert!(config.headers.is_empty());
        assert!(config.params.is_empty());
        assert!(config.timeout.is_none());
        assert!(config.cancel_token.is_none());
    }

    #[test]
    fn from_json_reads_camel_case_fields() {
        let config = RequestDescriptor::from_json(
            r#"{
                "url": "/upload",
                "method": "post",
                "data": "{\"a\":1}",
                "headers": {"Content-Type": "application/json"},
                "responseType": "text",
                "timeout": 500,
                "withCredentials": true,
                "xsrfCookieName": "XSRF-TOKEN",
                "xsrfHeaderName": "X-XSRF-TOKEN"
            }"#,
        )
        .unwrap();
        assert_eq!(config.method, "post");
        assert_eq!(config.data.as_deref(), Some("{\"a\":1}"));
        assert_eq!(config.headers["Content-Type"], "application/json");
        assert_eq!(config.response_type, Some(ResponseType::Text));
        assert_eq!(config.timeout, Some(500));
        assert_eq!(config.with_credentials, Some(true));
        assert_eq!(config.xsrf_cookie_name.as_deref(), Some("XSRF-TOKEN"));
        assert_eq!(config.xsrf_header_name.as_deref(), Some("X-XSRF-TOKEN"));
    }

    #[test]
    fn from_json_rejects_missing_url() {
        let err = RequestDescriptor::from_json(r#"{"method":"get"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDescriptor(_)));
    }

    #[test]
    fn response_type_uses_lowercase_names() {
        let parsed: ResponseType = serde_json::from_str(r#""arraybuffer""#).unwrap();
        assert_eq!(parsed, ResponseType::ArrayBuffer);
    }

    #[test]
    fn zero_timeout_is_no_timeout() {
        assert_eq!(RequestDescriptor::new("/").timeout(0).effective_timeout(), None);
        assert_eq!(RequestDescriptor::new("/").timeout(250).effective_timeout(), Some(250));
        assert_eq!(RequestDescriptor::new("/").effective_timeout(), None);
    }

    #[test]
    fn encode_params_moves_params_into_url() {
        let config = RequestDescriptor::new("/search")
            .param("q", "a b")
            .param("page", 2)
            .encode_params();
        assert_eq!(config.url, "/search?q=a+b&page=2");
        assert!(config.params.is_empty());
    }
}
