// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use parking_lot::Mutex;

/// The ordered record of normalized fault messages.
///
/// Entries are appended by the [`ErrorHandler`][crate::ErrorHandler] that owns
/// the log, one per failed invocation, in the order the failures complete.
/// The log is never pruned and does not deduplicate. Clones observe the same
/// entries.
///
/// # Examples
///
/// ```rust
/// use tripwire::{Descriptor, ErrorHandler};
///
/// let handler = ErrorHandler::default();
/// let log = handler.errors().clone();
/// assert!(log.is_empty());
///
/// let _ = handler.run(&Descriptor::new("parse"), || Err::<(), _>("bad token"));
///
/// assert_eq!(log.entries(), vec!["bad token".to_string()]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ErrorLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    /// A snapshot of all entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Iterates over a snapshot of the entries.
    pub fn iter(&self) -> impl Iterator<Item = String> {
        self.entries().into_iter()
    }

    /// The most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.entries.lock().last().cloned()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub(crate) fn push(&self, entry: String) {
        self.entries.lock().push(entry);
    }
}
