//! One-shot cancellation tokens.
//!
//! A `CancelSource` resolves its tokens at most once with a `Cancel` reason.
//! Tokens only observe; the single operation the request controller needs is
//! `CancelToken::cancelled`, which waits for that resolution.

use std::fmt;

use thiserror::Error;
use tokio::sync::watch;

/// The reason a request was cancelled, handed back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancel {
    pub message: Option<String>,
}

impl Cancel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "canceled"),
        }
    }
}

impl std::error::Error for Cancel {}

/// The source went away without ever cancelling.
#[derive(Debug, Clone, Error)]
#[error("cancel source dropped without cancelling")]
pub struct CancelWaitError;

/// Producer side. Dropping it without calling `cancel` leaves every token
/// unresolved forever.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<Option<Cancel>>,
}

impl CancelSource {
    pub fn new() -> (CancelSource, CancelToken) {
        let (tx, rx) = watch::channel(None);
        (CancelSource { tx }, CancelToken { rx })
    }

    /// Resolve all tokens with `reason`. Only the first call has an effect;
    /// returns whether this call was it.
    pub fn cancel(&self, reason: Cancel) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side, cheap to clone.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<Option<Cancel>>,
}

impl CancelToken {
    /// The reason, if the source has already cancelled.
    pub fn reason(&self) -> Option<Cancel> {
        self.rx.borrow().clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the source to cancel. Fails if the source is dropped first.
    pub async fn cancelled(&self) -> Result<Cancel, CancelWaitError> {
        let mut rx = self.rx.clone();
        let resolved = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| CancelWaitError)?;
        resolved.clone().ok_or(CancelWaitError)
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}
