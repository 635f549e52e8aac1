use crate::batch_tracker::BatchUpdateTracker;
use crate::{SortedIdsConfig, SortedIdsError};
use itertools::Itertools;
use std::hash::Hash;
use tracing::{debug, error, trace};

/// Which kind of edits are currently buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    None,
    InsertBatch,
    RemoveBatch,
    MixedBatch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortedIdsStats {
    /// Times buffered edits were merged into the sorted ids.
    pub resolves: usize,
    /// Resolves caused by a mixed batch rejecting an edit.
    pub forced_resolves: usize,
    /// Bloom hits in mixed batches that turned out not to conflict.
    pub bloom_false_positives: usize,
}

enum Pending<Id> {
    None,
    Inserts(Vec<Id>),
    Removes(Vec<Id>),
    Mixed(BatchUpdateTracker<Id>),
}

impl<Id> Default for Pending<Id> {
    fn default() -> Self {
        Pending::None
    }
}

/// A sorted multiset of ids that buffers edits and sorts lazily.
///
/// `insert` and `remove` only append to a pending buffer. The buffer is
/// merged into the sorted ids when [`SortedIdSet::ids`] (or
/// [`SortedIdSet::resolve`]) is called, or when a mixed batch of inserts and
/// removes can no longer be kept conflict-free. The result is always the same
/// as applying every call one at a time in call order.
pub struct SortedIdSet<Id> {
    ids: Vec<Id>,
    pending: Pending<Id>,
    config: SortedIdsConfig,
    stats: SortedIdsStats,
}

impl<Id: Ord + Hash + Clone> Default for SortedIdSet<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Ord + Hash + Clone> SortedIdSet<Id> {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            pending: Pending::None,
            config: SortedIdsConfig::default(),
            stats: SortedIdsStats::default(),
        }
    }

    pub fn with_config(config: SortedIdsConfig) -> Result<Self, SortedIdsError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Resolves pending edits and returns the ids in ascending order.
    pub fn ids(&mut self) -> &[Id] {
        self.resolve();
        &self.ids
    }

    /// Adds one occurrence of `id`.
    pub fn insert(&mut self, id: Id) {
        self.pending = match std::mem::take(&mut self.pending) {
            Pending::None => Pending::Inserts(vec![id]),
            Pending::Inserts(mut inserts) => {
                inserts.push(id);
                Pending::Inserts(inserts)
            }
            Pending::Removes(removes) => {
                self.resolve_pending(Pending::Removes(removes));
                let mut tracker = BatchUpdateTracker::new(&self.config);
                let accepted = tracker.try_insert(&id);
                debug_assert!(accepted);
                Pending::Mixed(tracker)
            }
            Pending::Mixed(mut tracker) => {
                if tracker.try_insert(&id) {
                    Pending::Mixed(tracker)
                } else {
                    self.force_resolve(tracker, "insert");
                    Pending::Inserts(vec![id])
                }
            }
        };
    }

    /// Removes at most one occurrence of `id`. Absent ids are ignored.
    pub fn remove(&mut self, id: Id) {
        self.pending = match std::mem::take(&mut self.pending) {
            Pending::None => Pending::Removes(vec![id]),
            Pending::Removes(mut removes) => {
                removes.push(id);
                Pending::Removes(removes)
            }
            Pending::Inserts(inserts) => {
                self.resolve_pending(Pending::Inserts(inserts));
                let mut tracker = BatchUpdateTracker::new(&self.config);
                let accepted = tracker.try_remove(&id);
                debug_assert!(accepted);
                Pending::Mixed(tracker)
            }
            Pending::Mixed(mut tracker) => {
                if tracker.try_remove(&id) {
                    Pending::Mixed(tracker)
                } else {
                    self.force_resolve(tracker, "remove");
                    Pending::Removes(vec![id])
                }
            }
        };
    }

    /// Removes the closed index range `[start, end]` of the sorted ids.
    ///
    /// Indices refer to the slice returned by [`SortedIdSet::ids`], so there
    /// must be no pending edits. A call with pending edits or an invalid range
    /// is reported as an error and leaves the set untouched.
    pub fn remove_range(&mut self, start: usize, end: usize) -> Result<(), SortedIdsError> {
        let pending = self.pending_len();
        if !matches!(self.pending, Pending::None) {
            error!(pending, start, end, "remove_range called with unresolved edits, skipping");
            return Err(SortedIdsError::PendingEdits { pending });
        }
        let len = self.ids.len();
        if start > end || end >= len {
            error!(start, end, len, "remove_range called with invalid range, skipping");
            return Err(SortedIdsError::InvalidRange { start, end, len });
        }
        if start == 0 && end + 1 == len {
            self.clear();
        } else {
            self.ids.drain(start..=end);
        }
        Ok(())
    }

    /// Drops every id and pending edit. Statistics are kept.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.pending = Pending::None;
    }

    /// Merges all pending edits into the sorted ids.
    pub fn resolve(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.resolve_pending(pending);
    }

    /// Closed index range of the ids `x` with `lo <= x <= hi`, after resolving.
    pub fn find_range(&mut self, lo: &Id, hi: &Id) -> Option<(usize, usize)> {
        self.resolve();
        if lo > hi {
            return None;
        }
        let (start, end) = self.covering_range(lo, hi);
        if start == end { None } else { Some((start, end - 1)) }
    }

    pub fn batch_mode(&self) -> BatchMode {
        match &self.pending {
            Pending::None => BatchMode::None,
            Pending::Inserts(_) => BatchMode::InsertBatch,
            Pending::Removes(_) => BatchMode::RemoveBatch,
            Pending::Mixed(_) => BatchMode::MixedBatch,
        }
    }

    pub fn pending_len(&self) -> usize {
        match &self.pending {
            Pending::None => 0,
            Pending::Inserts(edits) | Pending::Removes(edits) => edits.len(),
            Pending::Mixed(tracker) => tracker.len(),
        }
    }

    pub fn stats(&self) -> SortedIdsStats {
        self.stats
    }

    pub fn config(&self) -> &SortedIdsConfig {
        &self.config
    }

    fn force_resolve(&mut self, tracker: BatchUpdateTracker<Id>, edit: &'static str) {
        self.stats.forced_resolves += 1;
        debug!(
            edit,
            inserts = tracker.pending_inserts().len(),
            removes = tracker.pending_removes().len(),
            "mixed batch rejected edit, resolving"
        );
        self.resolve_pending(Pending::Mixed(tracker));
    }

    fn resolve_pending(&mut self, pending: Pending<Id>) {
        match pending {
            Pending::None => return,
            Pending::Inserts(inserts) => self.apply_inserts(inserts),
            Pending::Removes(removes) => self.apply_removes(removes),
            Pending::Mixed(tracker) => {
                self.stats.bloom_false_positives += tracker.false_positives();
                // the lists are disjoint, so the order only matters for cost
                let (inserts, removes) = tracker.into_parts();
                self.apply_removes(removes);
                self.apply_inserts(inserts);
            }
        }
        self.stats.resolves += 1;
    }

    fn apply_inserts(&mut self, mut inserts: Vec<Id>) {
        if inserts.is_empty() {
            return;
        }
        inserts.sort_unstable();
        if self.ids.is_empty() {
            self.ids = inserts;
            return;
        }

        let (lo, hi) = self.covering_range(&inserts[0], &inserts[inserts.len() - 1]);
        trace!(inserts = inserts.len(), affected = hi - lo, total = self.ids.len(), "merging inserts");
        let affected: Vec<Id> = self.ids.drain(lo..hi).collect();
        let merged: Vec<Id> = affected.into_iter().merge(inserts).collect();
        self.ids.splice(lo..lo, merged);
    }

    fn apply_removes(&mut self, mut removes: Vec<Id>) {
        if removes.is_empty() || self.ids.is_empty() {
            return;
        }
        removes.sort_unstable();

        let (lo, hi) = self.covering_range(&removes[0], &removes[removes.len() - 1]);
        if lo == hi {
            return;
        }
        if removes.len() == 1 {
            self.erase_one(lo, hi, &removes[0]);
            return;
        }

        let span = hi - lo;
        if span / removes.len() > self.config.remove_search_ratio {
            trace!(removes = removes.len(), affected = span, "erasing removes by search");
            // descending, so erasing never shifts positions still to be searched
            let mut hi = hi;
            for id in removes.iter().rev() {
                if self.erase_one(lo, hi, id) {
                    hi -= 1;
                }
            }
        } else {
            trace!(removes = removes.len(), affected = span, "erasing removes by difference");
            let affected: Vec<Id> = self.ids.drain(lo..hi).collect();
            let kept = multiset_difference(affected, removes);
            self.ids.splice(lo..lo, kept);
        }
    }

    fn erase_one(&mut self, lo: usize, hi: usize, id: &Id) -> bool {
        let pos = lo + self.ids[lo..hi].partition_point(|x| x < id);
        if pos < hi && self.ids[pos] == *id {
            self.ids.remove(pos);
            true
        } else {
            false
        }
    }

    /// Half-open index range of the ids within `[first, last]`.
    fn covering_range(&self, first: &Id, last: &Id) -> (usize, usize) {
        let lo = self.ids.partition_point(|x| x < first);
        let hi = lo + self.ids[lo..].partition_point(|x| x <= last);
        (lo, hi)
    }
}

impl<Id: Ord + Hash + Clone> FromIterator<Id> for SortedIdSet<Id> {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<Id: Ord + Hash + Clone> Extend<Id> for SortedIdSet<Id> {
    fn extend<I: IntoIterator<Item = Id>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

/// Drops one element of `from` for every equal element of `removes`.
/// Both inputs must be sorted; unmatched removes are ignored.
fn multiset_difference<Id: Ord>(from: Vec<Id>, removes: Vec<Id>) -> Vec<Id> {
    let mut kept = Vec::with_capacity(from.len());
    let mut removes = removes.into_iter().peekable();
    for id in from {
        while removes.next_if(|r| *r < id).is_some() {}
        if removes.next_if(|r| *r == id).is_none() {
            kept.push(id);
        }
    }
    kept
}
