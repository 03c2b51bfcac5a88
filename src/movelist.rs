//! Stack-allocated move buffer.
//!
//! Every search frame owns one `MoveList` on its stack (about 2KB), so generating moves at
//! a node never touches the heap and the buffer's lifetime is exactly the frame's.

use crate::types::Move;

/// Maximum number of moves in any legal chess position.
/// The theoretical maximum is 218, but 256 provides nice alignment.
pub const MAX_MOVES: usize = 256;

/// Fixed-capacity move list with a per-move ordering cost.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    costs: [i32; MAX_MOVES],
    count: usize,
}

impl MoveList {
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            moves: [Move::default(); MAX_MOVES],
            costs: [0; MAX_MOVES],
            count: 0,
        }
    }

    #[inline(always)]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.count < MAX_MOVES, "MoveList overflow");
        self.moves[self.count] = mv;
        self.costs[self.count] = 0;
        self.count += 1;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get a move by index (copy by value).
    /// Lets the search iterate the list while mutating the board.
    #[inline(always)]
    pub fn get(&self, idx: usize) -> Move {
        debug_assert!(idx < self.count, "MoveList index out of bounds");
        self.moves[idx]
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.count = 0;
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.count]
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, Move>> {
        self.as_slice().iter().copied()
    }

    #[inline]
    pub fn contains(&self, mv: Move) -> bool {
        self.as_slice().contains(&mv)
    }

    /// In-place filter: keep only moves for which the predicate returns true.
    #[inline]
    pub fn retain<F: FnMut(Move) -> bool>(&mut self, mut f: F) {
        let mut write_idx = 0;
        for read_idx in 0..self.count {
            let mv = self.moves[read_idx];
            if f(mv) {
                self.moves[write_idx] = mv;
                self.costs[write_idx] = self.costs[read_idx];
                write_idx += 1;
            }
        }
        self.count = write_idx;
    }

    /// Order moves by ascending cost, cheapest first.
    ///
    /// Stable insertion sort: lists are a few dozen moves long and equal-cost moves keep
    /// their generation order.
    pub fn sort_by_cost<F: FnMut(Move) -> i32>(&mut self, mut cost: F) {
        for i in 0..self.count {
            self.costs[i] = cost(self.moves[i]);
        }
        for i in 1..self.count {
            let mv = self.moves[i];
            let c = self.costs[i];
            let mut j = i;
            while j > 0 && self.costs[j - 1] > c {
                self.moves[j] = self.moves[j - 1];
                self.costs[j] = self.costs[j - 1];
                j -= 1;
            }
            self.moves[j] = mv;
            self.costs[j] = c;
        }
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = Move;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Move>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveList")
            .field("count", &self.count)
            .field(
                "moves",
                &self.iter().map(|m| m.to_uci()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoveFlags;
    use pretty_assertions::assert_eq;

    fn quiet(from: u8, to: u8) -> Move {
        Move::new(from, to, MoveFlags::QUIET)
    }

    #[test]
    fn test_movelist_basic() {
        let mut list = MoveList::new();
        assert!(list.is_empty());

        let m1 = Move::new(12, 28, MoveFlags::DOUBLE_PUSH); // e2e4
        let m2 = quiet(12, 20); // e2e3
        list.push(m1);
        list.push(m2);

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0), m1);
        assert_eq!(list.get(1), m2);
        assert!(list.contains(m2));
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_sort_by_cost_is_stable() {
        let mut list = MoveList::new();
        let moves = [quiet(0, 1), quiet(0, 2), quiet(0, 3), quiet(0, 4), quiet(0, 5)];
        for mv in moves {
            list.push(mv);
        }

        // Costs: 1->5, 2->0, 3->5, 4->-3, 5->0
        list.sort_by_cost(|mv| match mv.to {
            1 | 3 => 5,
            4 => -3,
            _ => 0,
        });

        let order: Vec<u8> = list.iter().map(|m| m.to).collect();
        assert_eq!(order, vec![4, 2, 5, 1, 3]);
    }

    #[test]
    fn test_movelist_retain() {
        let mut list = MoveList::new();
        list.push(quiet(0, 8));
        list.push(Move::new(8, 17, MoveFlags::CAPTURE));
        list.push(quiet(1, 9));

        list.retain(|m| m.is_capture());

        assert_eq!(list.len(), 1);
        assert!(list.get(0).is_capture());
    }
}
