//! Client location tracking.
//!
//! SYSTEM CONTEXT
//! ==============
//! The router commits guarded navigations here, and the HTTP wrapper reads
//! the current path and force-navigates to the login page on a 401. Forced
//! navigation is a hard jump: it does not run the guard.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::sync::{Mutex, PoisonError};

/// Read and replace the current client location.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    /// Jump to `path` without running navigation guards.
    fn force_navigate(&self, path: &str);
}

/// In-memory navigation history; the last entry is the current location.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self { entries: Mutex::new(vec![initial.to_owned()]) }
    }

    pub fn push(&self, path: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.last().is_some_and(|last| last == path) {
            return;
        }
        entries.push(path.to_owned());
    }

    /// Every visited location, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for History {
    fn current_path(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_owned())
    }

    fn force_navigate(&self, path: &str) {
        tracing::debug!(%path, "forced navigation");
        self.push(path);
    }
}
