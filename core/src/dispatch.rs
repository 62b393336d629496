//! Async driver: runs one request to its single outcome.
//!
//! # Design
//! Two branches race in one task: the transport's signal stream and, when a
//! cancel token is present, the wait on that token. Both feed the same
//! `RequestMachine`, whose latch keeps the first settle. Signals already
//! queued when the token resolves fired before it and are applied first, so
//! a response that completed ahead of the cancel still resolves; the
//! transport is aborted either way. A failed wait on the
//! token (its source dropped without cancelling) is logged and the branch
//! goes quiet; it never becomes a request failure.

use std::future::pending;

use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::cancel::{Cancel, CancelToken};
use crate::config::RequestDescriptor;
use crate::machine::RequestMachine;
use crate::response::Outcome;
use crate::transport::{signal_channel, Signal, Transport};
use crate::xsrf::Environment;

/// Send `config` over `transport` and wait for its outcome.
///
/// `config.url` is used as given; fold `params` in beforehand with
/// `RequestDescriptor::encode_params` if needed.
#[instrument(skip_all, fields(method = %config.method, url = %config.url))]
pub async fn dispatch<T: Transport>(
    config: RequestDescriptor,
    transport: T,
    env: &Environment,
) -> Outcome {
    let token = config.cancel_token.clone();
    let (sink, mut signals) = signal_channel();

    let mut machine = RequestMachine::new(config, transport);
    machine.open(env, sink);

    let cancelled = wait_for_cancel(token);
    tokio::pin!(cancelled);
    let mut cancel_armed = true;

    machine.send();

    loop {
        tokio::select! {
            biased;

            reason = &mut cancelled, if cancel_armed => {
                cancel_armed = false;
                if let Some(outcome) = drain_queued(&mut machine, &mut signals) {
                    machine.on_cancel(reason);
                    return outcome;
                }
                if let Some(outcome) = machine.on_cancel(reason) {
                    return outcome;
                }
            }

            signal = signals.recv() => {
                let settled = match signal {
                    Some(signal) => machine.on_signal(signal),
                    None => machine.on_transport_gone(),
                };
                if let Some(outcome) = settled {
                    return outcome;
                }
            }
        }
    }
}

/// Apply every signal the transport has already emitted, stopping at the
/// first one that settles the request.
fn drain_queued<T: Transport>(
    machine: &mut RequestMachine<T>,
    signals: &mut mpsc::UnboundedReceiver<Signal>,
) -> Option<Outcome> {
    while let Ok(signal) = signals.try_recv() {
        if let Some(outcome) = machine.on_signal(signal) {
            return Some(outcome);
        }
    }
    None
}

/// Resolves with the cancel reason, or never.
async fn wait_for_cancel(token: Option<CancelToken>) -> Cancel {
    let Some(token) = token else {
        return pending().await;
    };
    match token.cancelled().await {
        Ok(reason) => reason,
        Err(err) => {
            debug!(error = %err, "cancel token will never fire");
            pending().await
        }
    }
}
