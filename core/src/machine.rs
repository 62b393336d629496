//! The per-request state machine.
//!
//! # Design
//! `RequestMachine` owns one `Transport` for one `RequestDescriptor`. The
//! setup steps (`open`, `send`) are explicit transitions, and every way a
//! request can end (response, HTTP status failure, network error, timeout,
//! cancellation) goes through `settle`. A terminal state is absorbing, so
//! the first settle wins and anything later is dropped.
//!
//! The machine is synchronous and never waits. `dispatch` feeds it signals
//! and cancellation from async code; a host can also drive it directly.

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::cancel::Cancel;
use crate::config::{RequestDescriptor, ResponseType};
use crate::error::{ErrorKind, RequestError, TransportError, ECONNABORTED, NETWORK_ERROR};
use crate::headers::{parse_headers, strip_content_type_without_body};
use crate::response::{is_success_status, Outcome, ResponseRecord, TransportInfo};
use crate::transport::{ReadyState, ResponseData, Signal, SignalSink, Transport};
use crate::xsrf::{inject_xsrf_header, Environment};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Created, transport untouched.
    Idle,
    /// Transport configured and opened, headers applied.
    Opened,
    /// Payload handed to the transport; waiting for a signal.
    Sent,
    /// Resolved with a response.
    Succeeded,
    /// Rejected with a transport error of this kind.
    Failed(ErrorKind),
    /// Rejected with the caller's cancel reason.
    Cancelled,
}

impl State {
    /// `Succeeded`, `Failed` and `Cancelled` are absorbing.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Succeeded | State::Failed(_) | State::Cancelled)
    }
}

/// Drives one `Transport` through one request and produces its single
/// outcome.
pub struct RequestMachine<T> {
    id: Uuid,
    config: RequestDescriptor,
    transport: T,
    state: State,
}

impl<T: Transport> RequestMachine<T> {
    /// A fresh machine in `Idle`, with a new request id.
    pub fn new(config: RequestDescriptor, transport: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            transport,
            state: State::Idle,
        }
    }

    /// Request id, also carried in `TransportInfo` and log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Whether an outcome has already been produced.
    pub fn is_settled(&self) -> bool {
        self.state.is_terminal()
    }

    /// The descriptor, with headers as applied once `open` ran.
    pub fn config(&self) -> &RequestDescriptor {
        &self.config
    }

    /// The owned transport, for hosts that inspect it after settling.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `Idle -> Opened`: configure and open the transport, register `sink`
    /// for its signals, inject the XSRF header and apply request headers.
    pub fn open(&mut self, env: &Environment, sink: SignalSink) {
        if self.state != State::Idle {
            warn!(id = %self.id, state = ?self.state, "open ignored");
            return;
        }

        if let Some(response_type) = self.config.response_type {
            self.transport.set_response_type(response_type);
        }
        if let Some(timeout) = self.config.effective_timeout() {
            self.transport.set_timeout(timeout);
        }
        if let Some(with_credentials) = self.config.with_credentials {
            self.transport.set_with_credentials(with_credentials);
        }

        let method = self.config.method.to_uppercase();
        self.transport.open(&method, &self.config.url, true);
        self.transport.subscribe(sink);

        let mut headers = std::mem::take(&mut self.config.headers);
        inject_xsrf_header(&self.config, &mut headers, env);
        strip_content_type_without_body(&mut headers, self.config.data.is_some());
        for (name, value) in &headers {
            self.transport.set_request_header(name, value);
        }
        self.config.headers = headers;

        self.transition(State::Opened);
    }

    /// `Opened -> Sent`: hand the payload to the transport.
    pub fn send(&mut self) {
        if self.state != State::Opened {
            warn!(id = %self.id, state = ?self.state, "send ignored");
            return;
        }
        self.transport.send(self.config.data.as_deref());
        self.transition(State::Sent);
    }

    /// Feed one transport signal. Returns the outcome if this signal settled
    /// the request.
    pub fn on_signal(&mut self, signal: Signal) -> Option<Outcome> {
        if self.state != State::Sent {
            debug!(id = %self.id, state = ?self.state, ?signal, "signal dropped");
            return None;
        }
        match signal {
            Signal::ReadyStateChange => self.on_ready_state_change(),
            Signal::Error => {
                let err = self.transport_error(ErrorKind::Network, NETWORK_ERROR.to_string(), None, None);
                self.settle(State::Failed(ErrorKind::Network), Err(err.into()))
            }
            Signal::Timeout => {
                let message = format!("Timeout of {} ms exceeded", self.config.timeout.unwrap_or(0));
                let err = self.transport_error(ErrorKind::Timeout, message, Some(ECONNABORTED), None);
                self.settle(State::Failed(ErrorKind::Timeout), Err(err.into()))
            }
        }
    }

    /// The caller cancelled. The transport is aborted even when the request
    /// already settled; only the settlement itself is guarded.
    pub fn on_cancel(&mut self, reason: Cancel) -> Option<Outcome> {
        self.transport.abort();
        self.settle(State::Cancelled, Err(RequestError::Cancelled(reason)))
    }

    /// Every signal sink was dropped before the request settled: the
    /// transport is gone and nothing more will arrive.
    pub fn on_transport_gone(&mut self) -> Option<Outcome> {
        let err = self.transport_error(ErrorKind::Network, NETWORK_ERROR.to_string(), None, None);
        self.settle(State::Failed(ErrorKind::Network), Err(err.into()))
    }

    fn on_ready_state_change(&mut self) -> Option<Outcome> {
        if self.transport.ready_state() != ReadyState::Done {
            return None;
        }
        let status = self.transport.status();
        if status == 0 {
            // aborted or never connected; the error/abort paths report it
            debug!(id = %self.id, "completion with status 0 ignored");
            return None;
        }

        let response = self.response_record();
        if is_success_status(status) {
            self.settle(State::Succeeded, Ok(response))
        } else {
            let message = format!("Request failed with status code {status}");
            let err = self.transport_error(ErrorKind::HttpStatus, message, None, Some(response));
            self.settle(State::Failed(ErrorKind::HttpStatus), Err(err.into()))
        }
    }

    fn response_record(&self) -> ResponseRecord {
        let data = match self.config.response_type {
            Some(ResponseType::Text) => ResponseData::Text(self.transport.response_text()),
            _ => self.transport.response(),
        };
        ResponseRecord {
            data,
            status: self.transport.status(),
            status_text: self.transport.status_text(),
            headers: parse_headers(&self.transport.all_response_headers()),
            config: self.config.clone(),
            request: self.info(),
        }
    }

    fn transport_error(
        &self,
        kind: ErrorKind,
        message: String,
        code: Option<&'static str>,
        response: Option<ResponseRecord>,
    ) -> TransportError {
        TransportError {
            kind,
            message,
            config: self.config.clone(),
            code,
            request: self.info(),
            response,
        }
    }

    fn info(&self) -> TransportInfo {
        TransportInfo {
            id: self.id,
            method: self.config.method.to_uppercase(),
            url: self.config.url.clone(),
            ready_state: self.transport.ready_state(),
            status: self.transport.status(),
        }
    }

    /// The single terminal transition. Returns `None` once already settled.
    fn settle(&mut self, next: State, outcome: Outcome) -> Option<Outcome> {
        if self.state.is_terminal() {
            debug!(id = %self.id, state = ?self.state, attempted = ?next, "already settled");
            return None;
        }
        self.transition(next);
        Some(outcome)
    }

    fn transition(&mut self, next: State) {
        trace!(id = %self.id, from = ?self.state, to = ?next, "transition");
        self.state = next;
    }
}
