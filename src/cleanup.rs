//! Deferred best-effort cleanup
//!
//! Temporary directories are registered here as they are created and
//! released when the guard drops, whether the run succeeded or not.

use std::panic::{catch_unwind, AssertUnwindSafe};
use tempfile::TempDir;
use tracing::debug;

type CleanupAction = Box<dyn FnOnce() + Send>;

/// Ordered list of cleanup actions, run in reverse registration order on drop
#[derive(Default)]
pub struct Cleanup {
    actions: Vec<CleanupAction>,
}

impl Cleanup {
    /// Create an empty cleanup guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an arbitrary cleanup action
    pub fn register(&mut self, action: impl FnOnce() + Send + 'static) {
        self.actions.push(Box::new(action));
    }

    /// Take ownership of a temporary directory until the guard drops
    pub fn adopt(&mut self, dir: TempDir) {
        self.register(move || {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                debug!("Ignoring cleanup failure for {}: {}", path.display(), e);
            }
        });
    }

    /// Number of pending actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no actions are pending
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run all pending actions now
    pub fn run(&mut self) {
        while let Some(action) = self.actions.pop() {
            // A failing action must not keep the rest from running
            let _ = catch_unwind(AssertUnwindSafe(action));
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.run();
    }
}
