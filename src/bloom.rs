use fixedbitset::FixedBitSet;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Two-probe bloom filter with a fixed bit array and a soft capacity.
///
/// Both probes are sliced out of one 64-bit hash. There are no false
/// negatives; `is_full` reports when the intended capacity has been reached
/// so callers can stop trusting the false-positive rate.
pub struct BloomFilter {
    bits: FixedBitSet,
    num_bits: usize,
    capacity: usize,
    len: usize,
}

impl BloomFilter {
    pub fn new(num_bits: usize, capacity: usize) -> Self {
        let num_bits = num_bits.max(1);
        Self {
            bits: FixedBitSet::with_capacity(num_bits),
            num_bits,
            capacity,
            len: 0,
        }
    }

    pub fn insert<T: Hash + ?Sized>(&mut self, item: &T) {
        let (a, b) = self.probes(item);
        self.bits.insert(a);
        self.bits.insert(b);
        self.len += 1;
    }

    /// `false` means definitely absent.
    pub fn may_contain<T: Hash + ?Sized>(&self, item: &T) -> bool {
        let (a, b) = self.probes(item);
        self.bits.contains(a) && self.bits.contains(b)
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// Number of insertions, duplicates included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.bits.clear();
        self.len = 0;
    }

    fn probes<T: Hash + ?Sized>(&self, item: &T) -> (usize, usize) {
        let mut hasher = FxHasher::default();
        item.hash(&mut hasher);
        let h = mix64(hasher.finish());
        let lo = (h & 0xFFFF_FFFF) as usize % self.num_bits;
        let hi = (h >> 32) as usize % self.num_bits;
        (lo, hi)
    }
}

// splitmix64 finalizer, spreads Fx output across both halves
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
