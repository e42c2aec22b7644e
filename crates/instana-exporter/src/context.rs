//! Caller-supplied cancellation scope for export and shutdown calls.
//!
//! An [`ExportContext`] is a [`CancelScope`] plus an optional deadline.
//! Scopes form a tree: cancelling a parent cancels every [`child`] derived
//! from it, which is how exporter shutdown reaches in-flight exports.
//!
//! [`child`]: CancelScope::child

use std::future::{poll_fn, Future};
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A node in a cancellation tree.
///
/// Each scope owns one `watch` signal and holds its ancestors' signals, so it
/// reads as cancelled once it or any ancestor is cancelled. Cancellation is
/// permanent.
#[derive(Debug, Clone)]
pub struct CancelScope {
    // ancestors first, own signal last
    signals: Vec<Arc<watch::Sender<bool>>>,
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelScope {
    pub fn new() -> Self {
        Self {
            signals: vec![Self::signal()],
        }
    }

    fn signal() -> Arc<watch::Sender<bool>> {
        let (tx, _rx) = watch::channel(false);
        Arc::new(tx)
    }

    /// Derives a scope cancelled with this one but cancellable on its own.
    pub fn child(&self) -> Self {
        let mut signals = self.signals.clone();
        signals.push(Self::signal());
        Self { signals }
    }

    pub fn cancel(&self) {
        if let Some(own) = self.signals.last() {
            // send_replace stores the value even with no live receivers
            own.send_replace(true);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.signals.iter().any(|signal| *signal.borrow())
    }

    /// Resolves once this scope or any ancestor is cancelled.
    pub async fn cancelled(&self) {
        let mut waits: Vec<_> = self
            .signals
            .iter()
            .map(|signal| {
                let mut rx = signal.subscribe();
                Box::pin(async move {
                    // the sender lives in `self`, so this only ends on `true`
                    let _ = rx.wait_for(|cancelled| *cancelled).await;
                })
            })
            .collect();

        poll_fn(|cx| {
            if waits.iter_mut().any(|wait| wait.as_mut().poll(cx).is_ready()) {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    scope: CancelScope,
    deadline: Option<Instant>,
}

impl ExportContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            scope: CancelScope::new(),
            deadline: Some(deadline),
        }
    }

    /// Wraps an existing scope, e.g. one the caller cancels on its own shutdown.
    pub fn from_scope(scope: CancelScope) -> Self {
        Self {
            scope,
            deadline: None,
        }
    }

    /// Derives a child context: cancelled when this one is, with the same
    /// deadline, and cancellable on its own without affecting the parent.
    pub fn child(&self) -> Self {
        Self {
            scope: self.scope.child(),
            deadline: self.deadline,
        }
    }

    /// Narrows the deadline; an earlier existing deadline is kept.
    pub fn with_child_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let mut child = self.child();
        child.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        child
    }

    pub fn cancel(&self) {
        self.scope.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.scope.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.scope.cancelled() => ContextError::Cancelled,
                    () = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.scope.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}
