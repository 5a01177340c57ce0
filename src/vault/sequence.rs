//! Sequence ledger
//!
//! The monotonic action counter and the write-once record of executed
//! digests. Together they are the only guard against replay.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::crypto::Digest;
use crate::vault::error::VaultError;

/// Origin of the action counter; the first action carries `SEQUENCE_ORIGIN + 1`
pub const SEQUENCE_ORIGIN: u64 = 0;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceLedger {
    /// Number of actions executed so far
    counter: u64,
    /// Digests that have been executed; never pruned
    executed: HashSet<Digest>,
}

impl SequenceLedger {
    pub fn new() -> Self {
        Self {
            counter: SEQUENCE_ORIGIN,
            executed: HashSet::new(),
        }
    }

    /// Current counter value
    pub fn current(&self) -> u64 {
        self.counter
    }

    /// Sequence number the next action must carry
    pub fn expected_next(&self) -> u64 {
        self.counter + 1
    }

    /// Check that `sequence` is the next slot
    pub fn reserve(&self, sequence: u64) -> Result<(), VaultError> {
        let expected = self.expected_next();
        if sequence != expected {
            return Err(VaultError::InvalidNonce {
                expected,
                got: sequence,
            });
        }
        Ok(())
    }

    pub fn is_executed(&self, digest: &Digest) -> bool {
        self.executed.contains(digest)
    }

    /// Record `digest` as executed and advance the counter to `sequence`
    ///
    /// A digest can be recorded at most once.
    pub fn mark_executed(&mut self, digest: Digest, sequence: u64) -> Result<(), VaultError> {
        self.reserve(sequence)?;
        if !self.executed.insert(digest) {
            return Err(VaultError::TransactionAlreadyExecuted(digest));
        }
        self.counter = sequence;
        Ok(())
    }

    pub fn executed_count(&self) -> usize {
        self.executed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_origin() {
        let ledger = SequenceLedger::new();
        assert_eq!(ledger.current(), 0);
        assert_eq!(ledger.expected_next(), 1);
        assert_eq!(ledger.executed_count(), 0);
    }

    #[test]
    fn test_reserve_is_strict() {
        let ledger = SequenceLedger::new();
        assert!(ledger.reserve(1).is_ok());
        assert_eq!(
            ledger.reserve(0),
            Err(VaultError::InvalidNonce { expected: 1, got: 0 })
        );
        assert_eq!(
            ledger.reserve(2),
            Err(VaultError::InvalidNonce { expected: 1, got: 2 })
        );
    }

    #[test]
    fn test_mark_executed_advances_once() {
        let mut ledger = SequenceLedger::new();
        let first = Digest::of(b"first");

        ledger.mark_executed(first, 1).unwrap();
        assert_eq!(ledger.current(), 1);
        assert!(ledger.is_executed(&first));

        // Same slot again
        assert!(matches!(
            ledger.mark_executed(Digest::of(b"second"), 1),
            Err(VaultError::InvalidNonce { expected: 2, got: 1 })
        ));
        // Same digest at the next slot
        assert_eq!(
            ledger.mark_executed(first, 2),
            Err(VaultError::TransactionAlreadyExecuted(first))
        );
        assert_eq!(ledger.current(), 1);
        assert_eq!(ledger.executed_count(), 1);
    }
}
