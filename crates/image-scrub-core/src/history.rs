//! Bounded processing history
//!
//! [`HistoryStore`] keeps the most recent processing attempts, oldest first.
//! The record queue and the capacity share one lock, so the bounds check and
//! the mutation it guards always happen atomically.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use parking_lot::Mutex;

use crate::error::HistoryError;
use crate::types::{DEFAULT_HISTORY_SIZE, HistoryRecord, ProcessingOutcome};

/// Default history capacity
pub const DEFAULT_HISTORY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_HISTORY_SIZE)
{
    Some(v) => v,
    None => panic!("DEFAULT_HISTORY_SIZE must be non-zero"),
};

#[derive(Debug)]
struct HistoryInner {
    records: VecDeque<HistoryRecord>,
    capacity: NonZeroUsize,
}

impl HistoryInner {
    fn evict_to(&mut self, bound: usize) {
        while self.records.len() > bound {
            self.records.pop_front();
        }
    }
}

/// Fixed-capacity ledger of processing outcomes
#[derive(Debug)]
pub struct HistoryStore {
    inner: Mutex<HistoryInner>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    /// Create an empty store holding at most `capacity` records
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                records: VecDeque::with_capacity(capacity.get()),
                capacity,
            }),
        }
    }

    /// Append a record, evicting the oldest one if the store is full
    pub fn append(&self, record: HistoryRecord) {
        let mut inner = self.inner.lock();
        let bound = inner.capacity.get() - 1;
        inner.evict_to(bound);
        inner.records.push_back(record);
    }

    /// Records in insertion order, optionally only those with `filter` as outcome
    pub fn query(&self, filter: Option<ProcessingOutcome>) -> Vec<HistoryRecord> {
        let inner = self.inner.lock();
        match filter {
            None => inner.records.iter().cloned().collect(),
            Some(outcome) => inner
                .records
                .iter()
                .filter(|r| r.outcome == outcome)
                .cloned()
                .collect(),
        }
    }

    /// Like [`HistoryStore::query`], taking the filter as an outcome name
    ///
    /// `None` and the empty string mean "no filter". Names match case-insensitively.
    ///
    /// # Errors
    /// * `InvalidStatusFilter` - If the filter is not an outcome name
    pub fn query_by_name(&self, filter: Option<&str>) -> Result<Vec<HistoryRecord>, HistoryError> {
        let outcome = match filter {
            None | Some("") => None,
            Some(name) => Some(name.parse::<ProcessingOutcome>().map_err(|_| {
                HistoryError::InvalidStatusFilter {
                    filter: name.to_string(),
                }
            })?),
        };

        Ok(self.query(outcome))
    }

    /// Change the capacity, evicting the oldest records if the store shrinks
    ///
    /// # Errors
    /// * `InvalidHistorySize` - If `size` is zero or negative; the store is left unchanged
    pub fn set_capacity(&self, size: i64) -> Result<(), HistoryError> {
        let capacity = usize::try_from(size)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(HistoryError::InvalidHistorySize { size })?;

        let mut inner = self.inner.lock();
        inner.capacity = capacity;
        inner.evict_to(capacity.get());

        Ok(())
    }

    /// Current capacity
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity.get()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }
}
