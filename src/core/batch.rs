//! Per-item outcome tracking for batch operations.
//!
//! A batch never aborts because one record is bad or one write fails. Each
//! record ends up accepted, dropped (rejected by validation) or failed
//! (storage error), and the caller gets all three lists back.

/// A record rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    /// Position of the record in the submitted batch
    pub index: usize,
    /// Why the record was rejected
    pub reason: String,
}

/// A record that passed validation but could not be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// Position of the record in the submitted batch
    pub index: usize,
    /// User-facing message for the storage failure
    pub message: String,
}

/// Outcome of a batch operation.
#[derive(Debug, Clone)]
pub struct BatchReport<T> {
    /// Records that were stored, in submission order
    pub accepted: Vec<T>,
    /// Records rejected by validation
    pub dropped: Vec<DroppedItem>,
    /// Records that failed to store
    pub failed: Vec<FailedItem>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            dropped: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    /// Batch-level success flag: true when no record failed to store.
    ///
    /// Dropped records do not make a batch unsuccessful.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn drop_item(&mut self, index: usize, reason: impl Into<String>) {
        self.dropped.push(DroppedItem {
            index,
            reason: reason.into(),
        });
    }

    pub(crate) fn fail_item(&mut self, index: usize, message: impl Into<String>) {
        self.failed.push(FailedItem {
            index,
            message: message.into(),
        });
    }
}
