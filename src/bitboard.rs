//! Bitboard helpers and the precomputed attack tables used by move generation.
//!
//! A bitboard is a 64-bit integer where each bit represents a square on the chess board.
//! Square indexing: a1 = 0, b1 = 1, ..., h1 = 7, a2 = 8, ..., h8 = 63
//!
//! Sliding pieces are handled with plain ray tables: for every square and every compass
//! direction we store the squares strictly between the square and the board edge. The same
//! table doubles as the "ray beyond a blocker" continuation, so a ray is truncated at a
//! blocker with a single exclusive-or.

use crate::types::Color;

pub const FILE_A: u64 = 0x0101_0101_0101_0101;
pub const FILE_H: u64 = FILE_A << 7;
pub const RANK_1: u64 = 0xFF;
pub const RANK_2: u64 = RANK_1 << 8;
pub const RANK_3: u64 = RANK_1 << 16;
pub const RANK_6: u64 = RANK_1 << 40;
pub const RANK_7: u64 = RANK_1 << 48;
pub const RANK_8: u64 = RANK_1 << 56;

/// Convert a square index to a bitboard with that single bit set
#[inline(always)]
pub const fn sq_to_bb(sq: u8) -> u64 {
    1u64 << sq
}

/// Build a square index from a 0-indexed rank and file
#[inline(always)]
pub const fn make_sq(rank: u8, file: u8) -> u8 {
    rank * 8 + file
}

/// 0-indexed rank of a square (rank 1 = 0)
#[inline(always)]
pub const fn sq_rank(sq: u8) -> u8 {
    sq >> 3
}

/// 0-indexed file of a square (file a = 0)
#[inline(always)]
pub const fn sq_file(sq: u8) -> u8 {
    sq & 7
}

/// Algebraic name of a square, e.g. `e4`
pub fn square_name(sq: u8) -> String {
    format!("{}{}", (b'a' + sq_file(sq)) as char, (b'1' + sq_rank(sq)) as char)
}

/// Parse an algebraic square name such as `e4`
pub fn parse_square(s: &str) -> Option<u8> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let file = bytes[0].wrapping_sub(b'a');
    let rank = bytes[1].wrapping_sub(b'1');
    if file < 8 && rank < 8 {
        Some(make_sq(rank, file))
    } else {
        None
    }
}

/// Iterate over set bits in a bitboard, returning square indices
pub struct BitboardIter(pub u64);

impl Iterator for BitboardIter {
    type Item = u8;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            None
        } else {
            let sq = self.0.trailing_zeros() as u8;
            self.0 &= self.0 - 1; // Clear the lowest set bit
            Some(sq)
        }
    }
}

/// Compass directions for sliding pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    NorthEast,
    NorthWest,
    South,
    West,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::South,
        Direction::West,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Change in square index for one step along the direction
    #[inline(always)]
    pub const fn step(self) -> i8 {
        match self {
            Direction::North => 8,
            Direction::East => 1,
            Direction::NorthEast => 9,
            Direction::NorthWest => 7,
            Direction::South => -8,
            Direction::West => -1,
            Direction::SouthEast => -7,
            Direction::SouthWest => -9,
        }
    }

    /// Whether walking this direction visits increasing square indices.
    /// The nearest blocker on such a ray is the lowest set bit, otherwise the highest.
    #[inline(always)]
    pub const fn is_increasing(self) -> bool {
        self.step() > 0
    }

    const fn rank_file_delta(self) -> (i8, i8) {
        match self {
            Direction::North => (1, 0),
            Direction::East => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (1, -1),
            Direction::South => (-1, 0),
            Direction::West => (0, -1),
            Direction::SouthEast => (-1, 1),
            Direction::SouthWest => (-1, -1),
        }
    }

    /// Square on `ray` closest to the ray's origin
    #[inline(always)]
    pub fn nearest(self, ray: u64) -> u8 {
        debug_assert!(ray != 0);
        if self.is_increasing() {
            ray.trailing_zeros() as u8
        } else {
            63 - ray.leading_zeros() as u8
        }
    }
}

pub const ROOK_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

pub const BISHOP_DIRECTIONS: [Direction; 4] = [
    Direction::NorthEast,
    Direction::SouthEast,
    Direction::SouthWest,
    Direction::NorthWest,
];

/// Fixed squares involved in castling for one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingGeometry {
    pub king_from: u8,
    pub kingside_king_to: u8,
    pub queenside_king_to: u8,
    pub kingside_rook_from: u8,
    pub kingside_rook_to: u8,
    pub queenside_rook_from: u8,
    pub queenside_rook_to: u8,
    /// Squares the king crosses castling short; must be empty and unattacked
    pub kingside_path: u64,
    /// Squares the king crosses castling long; must be empty and unattacked
    pub queenside_path: u64,
    /// Square only the rook crosses castling long; must be empty
    pub queenside_rook_transit: u64,
}

impl CastlingGeometry {
    pub const fn for_color(color: Color) -> Self {
        match color {
            Color::White => Self::for_back_rank(0),
            Color::Black => Self::for_back_rank(56),
        }
    }

    const fn for_back_rank(base: u8) -> Self {
        CastlingGeometry {
            king_from: base + 4,
            kingside_king_to: base + 6,
            queenside_king_to: base + 2,
            kingside_rook_from: base + 7,
            kingside_rook_to: base + 5,
            queenside_rook_from: base,
            queenside_rook_to: base + 3,
            kingside_path: sq_to_bb(base + 5) | sq_to_bb(base + 6),
            queenside_path: sq_to_bb(base + 2) | sq_to_bb(base + 3),
            queenside_rook_transit: sq_to_bb(base + 1),
        }
    }
}

/// Precomputed attack tables.
///
/// Built once and shared read-only by every move generator; nothing here is global, so
/// tests are free to construct their own copy.
#[derive(Debug, Clone)]
pub struct AttackTables {
    /// Knight jumps for each square
    pub knight: [u64; 64],
    /// King steps for each square
    pub king: [u64; 64],
    /// rays[direction][square]: squares strictly between `square` and the edge
    rays: [[u64; 64]; 8],
    /// Castling squares indexed by color
    pub castling: [CastlingGeometry; 2],
}

impl AttackTables {
    pub fn new() -> Self {
        const KNIGHT_DELTAS: [(i8, i8); 8] = [
            (-2, -1), (-2, 1), (-1, -2), (-1, 2),
            (1, -2), (1, 2), (2, -1), (2, 1),
        ];
        const KING_DELTAS: [(i8, i8); 8] = [
            (-1, -1), (-1, 0), (-1, 1),
            (0, -1),           (0, 1),
            (1, -1),  (1, 0),  (1, 1),
        ];

        let on_board = |r: i8, f: i8| (0..8).contains(&r) && (0..8).contains(&f);
        let jumps = |sq: u8, deltas: &[(i8, i8); 8]| {
            let (rank, file) = (sq_rank(sq) as i8, sq_file(sq) as i8);
            deltas
                .iter()
                .map(|&(dr, df)| (rank + dr, file + df))
                .filter(|&(r, f)| on_board(r, f))
                .fold(0u64, |bb, (r, f)| bb | sq_to_bb(make_sq(r as u8, f as u8)))
        };

        let mut knight = [0u64; 64];
        let mut king = [0u64; 64];
        let mut rays = [[0u64; 64]; 8];

        for sq in 0..64u8 {
            knight[sq as usize] = jumps(sq, &KNIGHT_DELTAS);
            king[sq as usize] = jumps(sq, &KING_DELTAS);

            for dir in Direction::ALL {
                let (dr, df) = dir.rank_file_delta();
                let mut r = sq_rank(sq) as i8 + dr;
                let mut f = sq_file(sq) as i8 + df;
                while on_board(r, f) {
                    rays[dir.index()][sq as usize] |= sq_to_bb(make_sq(r as u8, f as u8));
                    r += dr;
                    f += df;
                }
            }
        }

        AttackTables {
            knight,
            king,
            rays,
            castling: [
                CastlingGeometry::for_color(Color::White),
                CastlingGeometry::for_color(Color::Black),
            ],
        }
    }

    /// Maximal ray from `sq` towards the edge, not including `sq`.
    /// Also serves as the continuation of any longer ray that passes through `sq`.
    #[inline(always)]
    pub fn ray(&self, sq: u8, dir: Direction) -> u64 {
        self.rays[dir.index()][sq as usize]
    }

    #[inline(always)]
    pub fn castling(&self, color: Color) -> &CastlingGeometry {
        &self.castling[color.index()]
    }

    /// Squares a slider on `sq` can move to along `dir`, the capture square included.
    ///
    /// The ray stops at whichever blocker is nearer: an enemy piece is included (it can be
    /// captured), a friendly piece stops the ray one square short.
    #[inline]
    pub fn slide(&self, sq: u8, dir: Direction, own: u64, enemy: u64) -> u64 {
        let ray = self.ray(sq, dir);
        let own_block = ray & own;
        let enemy_block = ray & enemy;

        let stop = match (own_block != 0, enemy_block != 0) {
            (false, false) => return ray,
            (false, true) => dir.nearest(enemy_block),
            (true, false) => before(dir.nearest(own_block), dir),
            (true, true) => {
                let own_sq = dir.nearest(own_block);
                let enemy_sq = dir.nearest(enemy_block);
                if dir.nearest(sq_to_bb(own_sq) | sq_to_bb(enemy_sq)) == enemy_sq {
                    enemy_sq
                } else {
                    before(own_sq, dir)
                }
            }
        };

        ray ^ self.ray(stop, dir)
    }

    /// Squares attacked along `dir` given full board occupancy
    #[inline]
    pub fn ray_attacks(&self, sq: u8, dir: Direction, occupied: u64) -> u64 {
        let ray = self.ray(sq, dir);
        let blockers = ray & occupied;
        if blockers == 0 {
            ray
        } else {
            ray ^ self.ray(dir.nearest(blockers), dir)
        }
    }

    pub fn rook_attacks(&self, sq: u8, occupied: u64) -> u64 {
        ROOK_DIRECTIONS
            .iter()
            .fold(0, |bb, &dir| bb | self.ray_attacks(sq, dir, occupied))
    }

    pub fn bishop_attacks(&self, sq: u8, occupied: u64) -> u64 {
        BISHOP_DIRECTIONS
            .iter()
            .fold(0, |bb, &dir| bb | self.ray_attacks(sq, dir, occupied))
    }
}

impl Default for AttackTables {
    fn default() -> Self {
        Self::new()
    }
}

/// The square one step back towards the ray origin
#[inline(always)]
fn before(sq: u8, dir: Direction) -> u8 {
    (sq as i8 - dir.step()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bb(squares: &[&str]) -> u64 {
        squares
            .iter()
            .fold(0, |acc, s| acc | sq_to_bb(parse_square(s).unwrap()))
    }

    #[test]
    fn test_square_names() {
        assert_eq!(parse_square("a1"), Some(0));
        assert_eq!(parse_square("h8"), Some(63));
        assert_eq!(parse_square("e4"), Some(28));
        assert_eq!(parse_square("i1"), None);
        assert_eq!(parse_square("a9"), None);
        assert_eq!(square_name(28), "e4");
    }

    #[test]
    fn test_knight_and_king_tables() {
        let tables = AttackTables::new();
        assert_eq!(tables.knight[0], bb(&["b3", "c2"]));
        assert_eq!(tables.knight[28].count_ones(), 8);
        assert_eq!(tables.king[0], bb(&["a2", "b1", "b2"]));
        assert_eq!(tables.king[63], bb(&["g8", "g7", "h7"]));
    }

    #[test]
    fn test_rays_exclude_origin() {
        let tables = AttackTables::new();
        assert_eq!(tables.ray(0, Direction::North), FILE_A & !sq_to_bb(0));
        assert_eq!(tables.ray(0, Direction::East), RANK_1 & !sq_to_bb(0));
        assert_eq!(tables.ray(0, Direction::South), 0);
        assert_eq!(tables.ray(27, Direction::SouthWest), bb(&["c3", "b2", "a1"]));
        assert_eq!(tables.ray(7, Direction::NorthWest).count_ones(), 7);
    }

    #[test]
    fn test_slide_stops_before_own_piece() {
        let tables = AttackTables::new();
        // Rook on a1, own piece on a4
        let reach = tables.slide(0, Direction::North, bb(&["a4"]), 0);
        assert_eq!(reach, bb(&["a2", "a3"]));

        // Adjacent own piece blocks everything
        let reach = tables.slide(0, Direction::North, bb(&["a2"]), 0);
        assert_eq!(reach, 0);
    }

    #[test]
    fn test_slide_includes_enemy_piece() {
        let tables = AttackTables::new();
        // Rook on h8 looking south, enemy on h5, own on h2
        let h8 = parse_square("h8").unwrap();
        let reach = tables.slide(h8, Direction::South, bb(&["h2"]), bb(&["h5"]));
        assert_eq!(reach, bb(&["h7", "h6", "h5"]));
    }

    #[test]
    fn test_slide_picks_closer_blocker() {
        let tables = AttackTables::new();
        let d4 = parse_square("d4").unwrap();

        // Own piece closer than enemy on a decreasing ray
        let reach = tables.slide(d4, Direction::West, bb(&["c4"]), bb(&["a4"]));
        assert_eq!(reach, 0);

        // Enemy closer than own on an increasing ray
        let reach = tables.slide(d4, Direction::NorthEast, bb(&["g7"]), bb(&["f6"]));
        assert_eq!(reach, bb(&["e5", "f6"]));

        // Own closer than enemy on an increasing ray
        let reach = tables.slide(d4, Direction::NorthEast, bb(&["f6"]), bb(&["g7"]));
        assert_eq!(reach, bb(&["e5"]));
    }

    #[test]
    fn test_ray_attacks_include_first_blocker() {
        let tables = AttackTables::new();
        let d4 = parse_square("d4").unwrap();
        let occupied = bb(&["d6", "b4", "f2"]);
        let attacks = tables.rook_attacks(d4, occupied);
        assert_eq!(
            attacks,
            bb(&["d5", "d6", "d3", "d2", "d1", "c4", "b4", "e4", "f4", "g4", "h4"])
        );
        let attacks = tables.bishop_attacks(d4, occupied);
        assert!(attacks & bb(&["f2"]) != 0);
        assert!(attacks & bb(&["g1"]) == 0);
    }

    #[test]
    fn test_castling_geometry() {
        let tables = AttackTables::new();
        let white = tables.castling(Color::White);
        assert_eq!(white.king_from, parse_square("e1").unwrap());
        assert_eq!(white.kingside_path, bb(&["f1", "g1"]));
        assert_eq!(white.queenside_path, bb(&["c1", "d1"]));
        assert_eq!(white.queenside_rook_transit, bb(&["b1"]));

        let black = tables.castling(Color::Black);
        assert_eq!(black.queenside_king_to, parse_square("c8").unwrap());
        assert_eq!(black.kingside_rook_to, parse_square("f8").unwrap());
    }
}
