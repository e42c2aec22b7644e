//! Exporter lifecycle state.

use crate::context::CancelScope;
use std::sync::atomic::{AtomicU8, Ordering};

/// Observable lifecycle of an exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExporterState {
    /// Accepting exports.
    Active = 0,
    /// Shutdown requested; cancellation is being fanned out.
    ShuttingDown = 1,
    /// Terminal; exports are silent no-ops.
    Shutdown = 2,
}

impl ExporterState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ExporterState::Active,
            1 => ExporterState::ShuttingDown,
            _ => ExporterState::Shutdown,
        }
    }
}

/// Shutdown flag plus the root cancellation scope of one exporter.
///
/// Every export derives its scope from [`ShutdownState::export_scope`], so
/// cancelling the root reaches all of them at once.
#[derive(Debug)]
pub(crate) struct ShutdownState {
    state: AtomicU8,
    root: CancelScope,
}

impl ShutdownState {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(ExporterState::Active as u8),
            root: CancelScope::new(),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> ExporterState {
        ExporterState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns `true` once shutdown has been requested.
    #[inline]
    pub(crate) fn is_shutdown(&self) -> bool {
        self.state() != ExporterState::Active
    }

    /// Scope for a single export; cancelled when shutdown is initiated.
    pub(crate) fn export_scope(&self) -> CancelScope {
        self.root.child()
    }

    /// Performs the one-time Active -> ShuttingDown -> Shutdown transition.
    ///
    /// Returns `false` if another caller already initiated shutdown.
    pub(crate) fn initiate(&self) -> bool {
        let won = self
            .state
            .compare_exchange(
                ExporterState::Active as u8,
                ExporterState::ShuttingDown as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if won {
            self.root.cancel();
            self.state
                .store(ExporterState::Shutdown as u8, Ordering::Release);
        }
        won
    }
}
