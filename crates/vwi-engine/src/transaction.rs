//! Counted undo transaction around a drag.
//!
//! A drag that asks for a transaction opens one when it starts; it closes
//! once the transformables have finished moving, which may be several frames
//! after release because of inertia and smoothing.

use tracing::debug;

/// Description used for drag transactions.
pub const MOVE_TRANSACTION_DESCRIPTION: &str = "Move Actors";

/// Outcome of [`TrackingTransaction::end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEnd {
    /// The outermost transaction closed
    Closed,
    /// A nested level closed; the transaction stays open
    Nested,
    /// Nothing was open
    NotOpen,
}

/// Nesting counter for the move transaction.
#[derive(Debug, Clone, Default)]
pub struct TrackingTransaction {
    trans_count: u32,
    description: Option<String>,
}

impl TrackingTransaction {
    /// Create a closed transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a level. Returns true if this opened the outermost level.
    pub fn begin(&mut self, description: &str) -> bool {
        self.trans_count += 1;
        if self.trans_count == 1 {
            debug!(description, "transaction began");
            self.description = Some(description.to_string());
            true
        } else {
            false
        }
    }

    /// Closes a level.
    pub fn end(&mut self) -> TransactionEnd {
        match self.trans_count {
            0 => TransactionEnd::NotOpen,
            1 => {
                self.trans_count = 0;
                self.description = None;
                debug!("transaction ended");
                TransactionEnd::Closed
            }
            _ => {
                self.trans_count -= 1;
                TransactionEnd::Nested
            }
        }
    }

    /// Whether a transaction is open
    pub fn is_active(&self) -> bool {
        self.trans_count > 0
    }

    /// Nesting depth
    pub fn trans_count(&self) -> u32 {
        self.trans_count
    }

    /// Description of the open transaction
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
