//! Caller-supplied execution context for store round trips.
//!
//! An [`OpContext`] carries an optional deadline and a cancellation signal.
//! Every storage operation runs its driver call through [`OpContext::run`],
//! so a canceled or expired context aborts the call instead of completing it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::StoreError;

/// Execution context for a storage operation.
///
/// Clones share the cancellation signal, so canceling any clone cancels
/// operations running under all of them.
#[derive(Debug, Clone)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: Arc<watch::Sender<bool>>,
}

impl OpContext {
    /// A context with no deadline that is only canceled explicitly.
    pub fn background() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            deadline: None,
            cancel: Arc::new(cancel),
        }
    }

    /// Derives a context that expires after `timeout`, keeping the
    /// earlier deadline if this one already has one.
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Derives a context that expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancel: Arc::clone(&self.cancel),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Signals cancellation to every operation using this context.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_canceled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Fails fast if the context is already canceled or past its deadline.
    pub fn check(&self) -> Result<(), StoreError> {
        if self.is_canceled() {
            return Err(StoreError::ContextCanceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(StoreError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Runs `fut` unless the context is canceled or expires first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.check()?;

        tokio::select! {
            biased;
            _ = canceled(self.cancel.subscribe()) => Err(StoreError::ContextCanceled),
            _ = sleep_until(self.deadline) => Err(StoreError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

impl Default for OpContext {
    fn default() -> Self {
        Self::background()
    }
}

async fn canceled(mut signal: watch::Receiver<bool>) {
    if signal.wait_for(|canceled| *canceled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
