//! Cancellation tokens for search operations.
//!
//! A search is superseded as soon as a newer search starts. Long loops poll
//! their token with `is_cancelled_sparse()`, which only reads the shared
//! atomic every `CANCEL_CHECK_INTERVAL` iterations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// How often long-running loops should check whether execution was cancelled.
/// Using a power of 2 allows efficient modulo via bitwise AND.
pub const CANCEL_CHECK_INTERVAL: usize = 0x1000; // 4,096

/// Tracks the active search version for cancellation.
///
/// When a new search starts, call `next_version()` to get a new version number.
/// Previous searches with older versions will be cancelled when they check
/// their `CancellationToken`.
#[derive(Debug, Default)]
pub struct SearchVersionTracker {
    active_version: Arc<AtomicU64>,
}

impl SearchVersionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the active version and returns the new version number.
    ///
    /// This effectively cancels any in-flight searches using older versions.
    pub fn next_version(&self) -> u64 {
        self.active_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current active version without incrementing.
    pub fn current_version(&self) -> u64 {
        self.active_version.load(Ordering::SeqCst)
    }

    /// Creates a cancellation token for the given version.
    ///
    /// The token reports cancellation once the active version moves past it.
    pub fn token_for_version(&self, version: u64) -> CancellationToken {
        CancellationToken {
            active_version: Some(self.active_version.clone()),
            version,
        }
    }

    /// Starts a new search: bumps the version and returns its token.
    pub fn start(&self) -> CancellationToken {
        let version = self.next_version();
        self.token_for_version(version)
    }
}

/// A cancellation token for terminating long-running operations.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    /// The shared active version; `None` for tokens that are never cancelled.
    active_version: Option<Arc<AtomicU64>>,
    /// The version this token was created with.
    version: u64,
}

impl CancellationToken {
    /// Creates a cancellation token that is never cancelled.
    ///
    /// Useful for tests or operations that should not be interruptible.
    #[inline]
    pub fn noop() -> Self {
        Self::default()
    }

    /// Checks if this token is still active.
    ///
    /// Returns `Some(())` if still active, `None` if cancelled.
    /// This enables use with the `?` operator for early returns.
    #[inline]
    pub fn is_cancelled(&self) -> Option<()> {
        match &self.active_version {
            Some(active) if active.load(Ordering::Relaxed) != self.version => None,
            _ => Some(()),
        }
    }

    /// Sparse cancellation check - only checks every `CANCEL_CHECK_INTERVAL` iterations.
    #[inline]
    pub fn is_cancelled_sparse(&self, counter: usize) -> Option<()> {
        if counter & (CANCEL_CHECK_INTERVAL - 1) == 0 {
            self.is_cancelled()
        } else {
            Some(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_token_is_never_cancelled() {
        let token = CancellationToken::noop();
        assert!(token.is_cancelled().is_some());
        assert!(CancellationToken::default().is_cancelled().is_some());
    }

    #[test]
    fn newer_version_cancels_older_token() {
        let tracker = SearchVersionTracker::new();
        let first = tracker.start();
        assert!(first.is_cancelled().is_some());

        let second = tracker.start();
        assert!(first.is_cancelled().is_none());
        assert!(second.is_cancelled().is_some());
        assert_eq!(tracker.current_version(), 2);
    }

    #[test]
    fn sparse_check_only_polls_on_interval() {
        let tracker = SearchVersionTracker::new();
        let token = tracker.start();
        tracker.next_version();

        assert!(token.is_cancelled_sparse(1).is_some());
        assert!(token.is_cancelled_sparse(0).is_none());
        assert!(token.is_cancelled_sparse(CANCEL_CHECK_INTERVAL).is_none());
    }
}
