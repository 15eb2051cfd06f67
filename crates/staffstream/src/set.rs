use crate::EmployeeRecord;
use core::iter::FusedIterator;
use std::sync::Arc;

/// An ordered, immutable collection of [`EmployeeRecord`]s.
///
/// Insertion order is generation order, which is also the order every
/// [`Export`] yields. A set never changes after construction, so it can be
/// wrapped in an [`Arc`] and read by any number of concurrent exports without
/// locking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Box<[EmployeeRecord]>,
}

impl RecordSet {
    pub fn from_records(records: Vec<EmployeeRecord>) -> Self {
        Self {
            records: records.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EmployeeRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, EmployeeRecord> {
        self.records.iter()
    }

    /// Starts a new export over a shared set.
    ///
    /// Every export begins at the first record, so two exports over the same
    /// set always yield identical sequences.
    pub fn export(self: &Arc<Self>) -> Export {
        Export {
            set: Arc::clone(self),
            next: 0,
            stopped: false,
        }
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a EmployeeRecord;
    type IntoIter = core::slice::Iter<'a, EmployeeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A forward-only cursor over a shared [`RecordSet`].
///
/// Yields one record per step in generation order. Once [`stop`](Self::stop)
/// is called, or the end of the set is reached, the cursor yields nothing
/// more. An export cannot be rewound; start a fresh one instead.
#[derive(Debug)]
pub struct Export {
    set: Arc<RecordSet>,
    next: usize,
    stopped: bool,
}

impl Export {
    /// Ends the export early. Subsequent calls to `next` return `None`.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of records yielded so far.
    pub const fn position(&self) -> usize {
        self.next
    }

    /// Number of records still to be yielded, zero once stopped.
    pub fn remaining(&self) -> usize {
        if self.stopped {
            0
        } else {
            self.set.len() - self.next
        }
    }

    /// Total number of records in the underlying set.
    pub fn total(&self) -> usize {
        self.set.len()
    }
}

impl Iterator for Export {
    type Item = EmployeeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        let record = self.set.get(self.next)?.clone();
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Export {}

impl FusedIterator for Export {}
