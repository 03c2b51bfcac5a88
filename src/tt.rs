/// Kind of bound a stored score represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bound {
    /// Empty slot
    #[default]
    None,
    /// Exact score
    Exact,
    /// Score is a lower bound (failed high)
    Lower,
    /// Score is an upper bound (failed low)
    Upper,
}

/// A single entry in the transposition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TTEntry {
    /// Zobrist hash of the position
    pub key: u64,
    /// Score of the position
    pub value: i32,
    /// Depth of the search when this entry was stored
    pub depth: i32,
    pub bound: Bound,
}

/// Low-order hash bits discarded before indexing
pub const KEY_OFFSET: u32 = 4;

/// Fixed-size, depth-preferred transposition table.
///
/// There is no chaining: two positions mapping to the same slot evict each other, and a
/// read re-checks the full key so an evicted position is simply a miss.
pub struct TranspositionTable {
    /// Table entries (power of 2 size for fast modulo via bitmask)
    entries: Vec<TTEntry>,
    /// Bitmask for indexing (size - 1)
    size_mask: u64,
    /// Statistics
    pub hits: u64,
    pub stores: u64,
    pub collisions: u64,
}

/// Largest supported table, `1 << 30` entries
pub const MAX_TT_BITS: u32 = 30;

impl TranspositionTable {
    /// Create a table with `1 << bits` entries, `bits` capped at `MAX_TT_BITS`
    pub fn new(bits: u32) -> Self {
        let num_entries = 1usize << bits.min(MAX_TT_BITS);
        TranspositionTable {
            entries: vec![TTEntry::default(); num_entries],
            size_mask: num_entries as u64 - 1,
            hits: 0,
            stores: 0,
            collisions: 0,
        }
    }

    /// Create a table using roughly `size_mb` megabytes, rounded down to a power of two
    pub fn with_size_mb(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<TTEntry>();
        let num_entries = ((size_mb * 1024 * 1024) / entry_size).max(1024);
        let bits = usize::BITS - 1 - num_entries.leading_zeros();
        Self::new(bits)
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        ((key >> KEY_OFFSET) & self.size_mask) as usize
    }

    /// Store a result unless the slot holds one searched deeper
    pub fn set(&mut self, key: u64, value: i32, depth: i32, bound: Bound) {
        let idx = self.index(key);
        let entry = &mut self.entries[idx];
        if depth < entry.depth {
            return;
        }
        if entry.bound != Bound::None && entry.key != key {
            self.collisions += 1;
        }
        *entry = TTEntry {
            key,
            value,
            depth,
            bound,
        };
        self.stores += 1;
    }

    /// Look up a position searched to at least `depth`.
    /// Returns the bound kind and stored value, or `None` when there is no usable entry.
    pub fn get(&mut self, key: u64, depth: i32) -> Option<(Bound, i32)> {
        let entry = &self.entries[self.index(key)];
        if entry.bound == Bound::None || entry.key != key || depth > entry.depth {
            return None;
        }
        self.hits += 1;
        Some((entry.bound, entry.value))
    }

    /// Clear all entries
    pub fn clear(&mut self) {
        self.entries.fill(TTEntry::default());
        self.hits = 0;
        self.stores = 0;
        self.collisions = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the fill rate (percentage of entries used)
    pub fn fill_rate(&self) -> f64 {
        let used = self.entries.iter().filter(|e| e.bound != Bound::None).count();
        (used as f64) / (self.entries.len() as f64) * 100.0
    }

    /// Get table size info
    pub fn info(&self) -> String {
        format!(
            "TT: {} entries, {:.1}% filled, {} hits, {} stores, {} collisions",
            self.entries.len(),
            self.fill_rate(),
            self.hits,
            self.stores,
            self.collisions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const KEY: u64 = 0x123456789ABCDEF0;

    #[test]
    fn test_tt_set_and_get() {
        let mut tt = TranspositionTable::new(10);
        tt.set(KEY, 100, 4, Bound::Exact);
        assert_eq!(tt.get(KEY, 4), Some((Bound::Exact, 100)));
        assert_eq!(tt.hits, 1);
    }

    #[test]
    fn test_tt_depth_requirement() {
        let mut tt = TranspositionTable::new(10);
        tt.set(KEY, 100, 3, Bound::Lower);

        assert_eq!(tt.get(KEY, 4), None);
        assert_eq!(tt.get(KEY, 3), Some((Bound::Lower, 100)));
        assert_eq!(tt.get(KEY, 1), Some((Bound::Lower, 100)));
    }

    #[test]
    fn test_tt_replacement_is_depth_preferred() {
        let mut tt = TranspositionTable::new(10);

        for (depth, value) in [(1, 10), (2, 20), (2, 25), (5, 50)] {
            tt.set(KEY, value, depth, Bound::Upper);
            assert_eq!(tt.get(KEY, depth), Some((Bound::Upper, value)));
        }

        // Shallower result leaves the entry alone
        tt.set(KEY, -7, 4, Bound::Exact);
        assert_eq!(tt.get(KEY, 5), Some((Bound::Upper, 50)));
    }

    #[test]
    fn test_tt_aliasing_slot_evicts_and_misses() {
        let mut tt = TranspositionTable::new(4);
        // Same slot: identical bits above KEY_OFFSET within the mask
        let other = KEY ^ (1 << 40);
        tt.set(KEY, 100, 3, Bound::Exact);
        assert_eq!(tt.get(other, 1), None);

        tt.set(other, 7, 3, Bound::Exact);
        assert_eq!(tt.collisions, 1);
        assert_eq!(tt.get(KEY, 1), None);
        assert_eq!(tt.get(other, 3), Some((Bound::Exact, 7)));
    }

    #[test]
    fn test_tt_noise_bits_do_not_change_slot() {
        let mut tt = TranspositionTable::new(8);
        tt.set(KEY, 1, 2, Bound::Exact);
        // Differs only in the discarded low bits: same slot, different key
        tt.set(KEY ^ 0b1, 2, 2, Bound::Exact);
        assert_eq!(tt.get(KEY, 2), None);
        assert_eq!(tt.get(KEY ^ 0b1, 2), Some((Bound::Exact, 2)));
    }

    #[test]
    fn test_tt_clear() {
        let mut tt = TranspositionTable::new(10);
        tt.set(KEY, 100, 4, Bound::Exact);
        assert!(tt.get(KEY, 4).is_some());

        tt.clear();
        assert_eq!(tt.get(KEY, 0), None);
        assert_eq!(tt.fill_rate(), 0.0);
    }

    #[test]
    fn test_tt_with_size_mb_is_power_of_two() {
        let tt = TranspositionTable::with_size_mb(1);
        assert!(tt.len().is_power_of_two());
        assert!(tt.len() * std::mem::size_of::<TTEntry>() <= 1024 * 1024);
    }
}
