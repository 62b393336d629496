//! The host-provided network primitive.
//!
//! # Design
//! The core never performs I/O. A host implements `Transport` over whatever
//! actually moves bytes (a browser XHR, a native HTTP stack, a test double)
//! and reports lifecycle changes through the `SignalSink` it receives in
//! `subscribe`. The controller reads status, headers and body back through
//! the getters once a signal arrives.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::ResponseType;

/// Lifecycle stage of the transport. Only `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Unsent = 0,
    Opened = 1,
    HeadersReceived = 2,
    Loading = 3,
    Done = 4,
}

/// Lifecycle notifications a transport emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// `ready_state()` changed; the controller checks it.
    ReadyStateChange,
    /// The request failed below HTTP (DNS, connection reset, CORS, ...).
    Error,
    /// The configured timeout elapsed.
    Timeout,
}

/// Where a transport reports its signals. Cloneable; dropping every clone
/// without a terminal signal means the transport went away.
#[derive(Debug, Clone)]
pub struct SignalSink {
    tx: mpsc::UnboundedSender<Signal>,
}

impl SignalSink {
    /// The transport's `ready_state()` moved.
    pub fn ready_state_changed(&self) {
        self.emit(Signal::ReadyStateChange);
    }

    /// The exchange failed below HTTP.
    pub fn error(&self) {
        self.emit(Signal::Error);
    }

    /// The configured timeout elapsed.
    pub fn timeout(&self) {
        self.emit(Signal::Timeout);
    }

    pub fn emit(&self, signal: Signal) {
        // The receiver is gone once the request settled; late signals are moot.
        let _ = self.tx.send(signal);
    }
}

/// A connected sink and receiver, for hosts that drive `RequestMachine` themselves.
pub fn signal_channel() -> (SignalSink, mpsc::UnboundedReceiver<Signal>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalSink { tx }, rx)
}

/// Response body as decoded by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    /// No body, or one the transport could not decode.
    Empty,
    Text(String),
    Json(Value),
    Bytes(Vec<u8>),
}

impl ResponseData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// One underlying network operation, driven by the request controller.
///
/// Calls arrive in this order: the optional setters, `open`, `subscribe`,
/// `set_request_header` per header, `send`; `abort` may follow at any point.
pub trait Transport {
    /// How `response` should decode the body. Not called when unset.
    fn set_response_type(&mut self, response_type: ResponseType);

    /// Milliseconds before the transport emits `Signal::Timeout`. Only
    /// called with a non-zero value.
    fn set_timeout(&mut self, timeout_ms: u64);

    /// Whether cross-site requests carry credentials.
    fn set_with_credentials(&mut self, with_credentials: bool);

    /// Prepare the request. `method` is already upper-cased; the controller
    /// always passes `asynchronous = true`.
    fn open(&mut self, method: &str, url: &str, asynchronous: bool);

    /// Register where signals go. Called once, right after `open`.
    fn subscribe(&mut self, sink: SignalSink);

    /// Add one request header, name as given by the caller.
    fn set_request_header(&mut self, name: &str, value: &str);

    /// Start the exchange. Must not block; completion is reported through
    /// the sink.
    fn send(&mut self, body: Option<&str>);

    /// Stop the exchange. May be called after completion and must tolerate it.
    fn abort(&mut self);

    fn ready_state(&self) -> ReadyState;

    /// HTTP status, `0` until a response arrived or after an abort.
    fn status(&self) -> u16;

    /// Reason phrase, empty when unknown.
    fn status_text(&self) -> String;

    /// Raw `name: value` lines separated by CRLF.
    fn all_response_headers(&self) -> String;

    /// The body as text, regardless of the response type.
    fn response_text(&self) -> String;

    /// The body decoded according to the configured response type.
    fn response(&self) -> ResponseData;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn set_response_type(&mut self, response_type: ResponseType) {
        (**self).set_response_type(response_type)
    }

    fn set_timeout(&mut self, timeout_ms: u64) {
        (**self).set_timeout(timeout_ms)
    }

    fn set_with_credentials(&mut self, with_credentials: bool) {
        (**self).set_with_credentials(with_credentials)
    }

    fn open(&mut self, method: &str, url: &str, asynchronous: bool) {
        (**self).open(method, url, asynchronous)
    }

    fn subscribe(&mut self, sink: SignalSink) {
        (**self).subscribe(sink)
    }

    fn set_request_header(&mut self, name: &str, value: &str) {
        (**self).set_request_header(name, value)
    }

    fn send(&mut self, body: Option<&str>) {
        (**self).send(body)
    }

    fn abort(&mut self) {
        (**self).abort()
    }

    fn ready_state(&self) -> ReadyState {
        (**self).ready_state()
    }

    fn status(&self) -> u16 {
        (**self).status()
    }

    fn status_text(&self) -> String {
        (**self).status_text()
    }

    fn all_response_headers(&self) -> String {
        (**self).all_response_headers()
    }

    fn response_text(&self) -> String {
        (**self).response_text()
    }

    fn response(&self) -> ResponseData {
        (**self).response()
    }
}
