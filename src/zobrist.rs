use once_cell::sync::Lazy;

use crate::types::{Color, PieceType};

/// Zobrist hashing keys for chess positions.
/// Pseudo-random u64 values XORed together into a position hash, used as the
/// transposition table key.
pub struct ZobristKeys {
    /// Indexed as pieces[color][piece_type][square]: 2 * 6 * 64 = 768 keys
    pub pieces: [[[u64; 64]; 6]; 2],
    /// XORed in when black is to move
    pub side_to_move: u64,
    /// One key per castling-right bit (see `board::castling`)
    pub castling: [u64; 4],
    /// Keyed by the file of the en passant target square
    pub en_passant: [u64; 8],
}

impl ZobristKeys {
    /// Keys are generated from a fixed seed so hashes are reproducible across runs.
    pub fn new() -> Self {
        let mut rng = XorShift64::new(0x1234567890ABCDEF);

        let mut pieces = [[[0u64; 64]; 6]; 2];
        for color in pieces.iter_mut() {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.next();
                }
            }
        }

        let side_to_move = rng.next();
        let castling = std::array::from_fn(|_| rng.next());
        let en_passant = std::array::from_fn(|_| rng.next());

        ZobristKeys {
            pieces,
            side_to_move,
            castling,
            en_passant,
        }
    }

    #[inline(always)]
    pub fn piece(&self, color: Color, piece: PieceType, sq: u8) -> u64 {
        self.pieces[color.index()][piece.index()][sq as usize]
    }

    /// Combined key for a castling-rights bit set
    #[inline]
    pub fn castling_rights(&self, rights: u8) -> u64 {
        self.castling
            .iter()
            .enumerate()
            .filter(|(bit, _)| rights & (1 << bit) != 0)
            .fold(0, |hash, (_, key)| hash ^ key)
    }

    #[inline(always)]
    pub fn en_passant_square(&self, sq: u8) -> u64 {
        self.en_passant[(sq & 7) as usize]
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple XorShift64 PRNG for deterministic key generation
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        XorShift64 { state: seed }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Process-wide keys, built on first use
pub static ZOBRIST_KEYS: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);
