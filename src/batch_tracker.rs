use crate::SortedIdsConfig;
use crate::bloom::BloomFilter;
use std::hash::Hash;

/// Pending edits of a mixed batch.
///
/// Holds the buffered inserts and removes of a [`crate::SortedIdSet`] that is
/// absorbing both kinds of edit at once. An edit is only accepted when it is
/// disjoint from every pending edit of the opposite kind, so the two lists
/// can later be applied in either order with the same result.
pub struct BatchUpdateTracker<Id> {
    insert_bloom: BloomFilter,
    remove_bloom: BloomFilter,
    inserts: Vec<Id>,
    removes: Vec<Id>,
    false_positives: usize,
}

impl<Id: Ord + Hash + Clone> BatchUpdateTracker<Id> {
    pub fn new(config: &SortedIdsConfig) -> Self {
        Self {
            insert_bloom: BloomFilter::new(config.bloom_bits, config.bloom_capacity),
            remove_bloom: BloomFilter::new(config.bloom_bits, config.bloom_capacity),
            inserts: Vec::new(),
            removes: Vec::new(),
            false_positives: 0,
        }
    }

    /// Accepts and records `id` as a pending insert, or returns `false` if the
    /// caller must resolve first.
    pub fn try_insert(&mut self, id: &Id) -> bool {
        if self.insert_bloom.is_full() {
            return false;
        }
        if self.remove_bloom.may_contain(id) {
            if self.removes.contains(id) {
                return false;
            }
            self.false_positives += 1;
        }
        self.insert_bloom.insert(id);
        self.inserts.push(id.clone());
        true
    }

    /// Accepts and records `id` as a pending remove, or returns `false` if the
    /// caller must resolve first.
    pub fn try_remove(&mut self, id: &Id) -> bool {
        if self.remove_bloom.is_full() {
            return false;
        }
        if self.insert_bloom.may_contain(id) {
            if self.inserts.contains(id) {
                return false;
            }
            self.false_positives += 1;
        }
        self.remove_bloom.insert(id);
        self.removes.push(id.clone());
        true
    }

    pub fn pending_inserts(&self) -> &[Id] {
        &self.inserts
    }

    pub fn pending_removes(&self) -> &[Id] {
        &self.removes
    }

    pub fn len(&self) -> usize {
        self.inserts.len() + self.removes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.removes.is_empty()
    }

    /// Bloom hits that the linear scan showed to be spurious.
    pub fn false_positives(&self) -> usize {
        self.false_positives
    }

    /// Consumes the tracker, returning `(inserts, removes)` in call order.
    pub fn into_parts(self) -> (Vec<Id>, Vec<Id>) {
        (self.inserts, self.removes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(capacity: usize) -> BatchUpdateTracker<String> {
        BatchUpdateTracker::new(&SortedIdsConfig {
            bloom_capacity: capacity,
            ..Default::default()
        })
    }

    #[test]
    fn test_disjoint_edits_accepted() {
        let mut t = tracker(1024);
        for i in 0..100 {
            assert!(t.try_remove(&format!("/X/{}", i)));
            assert!(t.try_insert(&format!("/Y/{}", i)));
        }
        assert_eq!(t.pending_inserts().len(), 100);
        assert_eq!(t.pending_removes().len(), 100);
        assert_eq!(t.len(), 200);
    }

    #[test]
    fn test_insert_of_pending_remove_rejected() {
        let mut t = tracker(1024);
        assert!(t.try_remove(&"/A".to_string()));
        assert!(!t.try_insert(&"/A".to_string()));
        assert!(t.pending_inserts().is_empty());
    }

    #[test]
    fn test_remove_of_pending_insert_rejected() {
        let mut t = tracker(1024);
        assert!(t.try_insert(&"/A".to_string()));
        assert!(!t.try_remove(&"/A".to_string()));
        assert!(t.pending_removes().is_empty());
    }

    #[test]
    fn test_same_direction_repeats_accepted() {
        let mut t = tracker(1024);
        assert!(t.try_insert(&"/A".to_string()));
        assert!(t.try_insert(&"/A".to_string()));
        assert!(t.try_remove(&"/B".to_string()));
        assert!(t.try_remove(&"/B".to_string()));
        let (inserts, removes) = t.into_parts();
        assert_eq!(inserts, vec!["/A", "/A"]);
        assert_eq!(removes, vec!["/B", "/B"]);
    }

    #[test]
    fn test_capacity_rejects_unconditionally() {
        let mut t = tracker(2);
        assert!(t.try_insert(&"/A".to_string()));
        assert!(t.try_insert(&"/B".to_string()));
        assert!(!t.try_insert(&"/C".to_string()));
        // the remove side still has room
        assert!(t.try_remove(&"/D".to_string()));
        assert!(t.try_remove(&"/E".to_string()));
        assert!(!t.try_remove(&"/F".to_string()));
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_false_positive_is_accepted() {
        // a single-word filter saturates quickly, so most probes hit
        let mut t: BatchUpdateTracker<u32> = BatchUpdateTracker::new(&SortedIdsConfig {
            bloom_bits: 64,
            bloom_capacity: 1024,
            ..Default::default()
        });
        for i in 0..200 {
            assert!(t.try_remove(&i));
        }
        for i in 1000..1200 {
            assert!(t.try_insert(&i));
        }
        assert!(t.false_positives() > 0);
        assert!(!t.is_empty());
    }
}
