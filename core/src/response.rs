//! Settled request outcomes.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::config::RequestDescriptor;
use crate::error::RequestError;
use crate::transport::{ReadyState, ResponseData};

/// What a request resolves to: either a response or a classified error.
pub type Outcome = Result<ResponseRecord, RequestError>;

/// Diagnostic snapshot of the transport at settle time.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportInfo {
    pub id: Uuid,
    pub method: String,
    pub url: String,
    pub ready_state: ReadyState,
    pub status: u16,
}

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub data: ResponseData,
    pub status: u16,
    pub status_text: String,
    /// Lower-cased names.
    pub headers: BTreeMap<String, String>,
    /// The descriptor as sent, including injected or removed headers.
    pub config: RequestDescriptor,
    pub request: TransportInfo,
}

impl ResponseRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// `[200, 300)` and `304` settle as success.
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status) || status == 304
}
