//! Transport core of an HTTP client.
//!
//! # Overview
//! Turns a `RequestDescriptor` into exactly one in-flight operation on a
//! host-provided `Transport` and settles it exactly once, as a
//! `ResponseRecord` or a `RequestError`. The core never touches the network
//! itself (host-does-IO pattern).
//!
//! # Design
//! - `query::build_url` serializes query params; it runs upstream of the
//!   controller.
//! - `origin` + `cookie` + `xsrf` decide whether the XSRF cookie is echoed
//!   into a request header. Page origin and cookies are injected through
//!   `Environment`.
//! - `machine::RequestMachine` is the synchronous state machine; every
//!   terminal path funnels through one latched settle.
//! - `dispatch::dispatch` drives the machine from async code and races it
//!   against the descriptor's `CancelToken`.

pub mod cancel;
pub mod config;
pub mod cookie;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod machine;
pub mod origin;
pub mod query;
pub mod response;
pub mod transport;
pub mod xsrf;

pub use cancel::{Cancel, CancelSource, CancelToken, CancelWaitError};
pub use config::{ConfigError, Headers, RequestDescriptor, ResponseType};
pub use cookie::{CookieStore, DocumentCookies};
pub use dispatch::dispatch;
pub use error::{ErrorKind, RequestError, TransportError, ECONNABORTED};
pub use headers::parse_headers;
pub use machine::{RequestMachine, State};
pub use origin::{is_url_same_origin, resolve_url, FixedOrigin, Origin, OriginProvider};
pub use query::{build_url, ParamValue, Params};
pub use response::{is_success_status, Outcome, ResponseRecord, TransportInfo};
pub use transport::{signal_channel, ReadyState, ResponseData, Signal, SignalSink, Transport};
pub use xsrf::{inject_xsrf_header, Environment};
