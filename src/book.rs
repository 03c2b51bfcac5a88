use std::collections::HashMap;

use rand::prelude::*;

use crate::bitboard::AttackTables;
use crate::board::Board;
use crate::error::Result;
use crate::movegen::MoveGenerator;
use crate::types::Move;

/// Book moves are only consulted up to this full-move number
pub const BOOK_HORIZON: u32 = 8;

/// Mainlines in coordinate notation, each played from the starting position
const DEFAULT_LINES: &[&str] = &[
    // Ruy Lopez
    "e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4 g8f6 e1g1 f8e7",
    // Italian
    "e2e4 e7e5 g1f3 b8c6 f1c4 f8c5 c2c3 g8f6 d2d4 e5d4",
    // Sicilian Najdorf
    "e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6 b1c3 a7a6",
    // French
    "e2e4 e7e6 d2d4 d7d5 b1c3 g8f6 c1g5 f8e7",
    // Caro-Kann
    "e2e4 c7c6 d2d4 d7d5 b1c3 d5e4 c3e4 c8f5",
    // Queen's Gambit Declined
    "d2d4 d7d5 c2c4 e7e6 b1c3 g8f6 c1g5 f8e7",
    // Nimzo-Indian
    "d2d4 g8f6 c2c4 e7e6 b1c3 f8b4 e2e3 e8g8",
    // King's Indian
    "d2d4 g8f6 c2c4 g7g6 b1c3 f8g7 e2e4 d7d6 g1f3 e8g8",
    // English
    "c2c4 e7e5 b1c3 g8f6 g1f3 b8c6 g2g3 d7d5 c4d5 f6d5",
    // Reti
    "g1f3 d7d5 g2g3 g8f6 f1g2 e7e6 e1g1 f8e7",
];

/// Opening moves indexed by position hash.
pub struct OpeningBook {
    entries: HashMap<u64, Vec<Move>>,
    horizon: u32,
}

impl OpeningBook {
    /// Book built from the bundled mainlines
    pub fn new(tables: &AttackTables) -> Result<Self> {
        Self::from_lines(tables, DEFAULT_LINES.iter().copied())
    }

    /// Build a book by replaying each line from the starting position.
    /// Fails on the first move that does not parse or is not legal.
    pub fn from_lines<'s, I>(tables: &AttackTables, lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let movegen = MoveGenerator::new(tables);
        let mut entries: HashMap<u64, Vec<Move>> = HashMap::new();

        for line in lines {
            let mut board = Board::new();
            for token in line.split_whitespace() {
                let mv = movegen.parse_uci_move(&board, token)?;
                let known = entries.entry(board.hash()).or_default();
                if !known.contains(&mv) {
                    known.push(mv);
                }
                board.make_move(mv);
            }
        }

        Ok(OpeningBook {
            entries,
            horizon: BOOK_HORIZON,
        })
    }

    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    /// Whether the game is still early enough to consult the book
    pub fn in_book(&self, board: &Board) -> bool {
        board.fullmove_number() <= self.horizon
    }

    /// Known continuations for a position
    pub fn moves(&self, board: &Board) -> &[Move] {
        self.entries
            .get(&board.hash())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pick a random known continuation that is legal in `board`
    pub fn select(&self, tables: &AttackTables, board: &Board) -> Option<Move> {
        if !self.in_book(board) {
            return None;
        }
        let candidates = self.moves(board);
        if candidates.is_empty() {
            return None;
        }

        // Guards against a hash collision handing back another position's moves
        let legal = MoveGenerator::new(tables).legal_moves(board);
        let playable: Vec<Move> = candidates
            .iter()
            .copied()
            .filter(|mv| legal.contains(mv))
            .collect();

        playable.choose(&mut thread_rng()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
