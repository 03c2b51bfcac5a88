//! Bitboard position: piece placement, side to move, castling rights, en passant target,
//! move clocks and an incrementally updated Zobrist hash.
//!
//! Moves are applied in place with `make_move` and reverted with `undo_move`; the pair
//! restores the board exactly, which the search relies on at every node.

use std::fmt;

use crate::bitboard::{parse_square, sq_rank, sq_to_bb, square_name, BitboardIter, CastlingGeometry};
use crate::error::{ChessError, Result};
use crate::types::{Color, Move, MoveFlags, PieceType};
use crate::zobrist::ZOBRIST_KEYS;

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Castling-right bits
pub mod castling {
    use crate::types::Color;

    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 1 << 1;
    pub const BLACK_KINGSIDE: u8 = 1 << 2;
    pub const BLACK_QUEENSIDE: u8 = 1 << 3;
    pub const ALL: u8 = 0b1111;

    pub const fn kingside(color: Color) -> u8 {
        match color {
            Color::White => WHITE_KINGSIDE,
            Color::Black => BLACK_KINGSIDE,
        }
    }

    pub const fn queenside(color: Color) -> u8 {
        match color {
            Color::White => WHITE_QUEENSIDE,
            Color::Black => BLACK_QUEENSIDE,
        }
    }

    /// Rights lost when a piece moves from or to `sq`
    pub const fn lost_by_touching(sq: u8) -> u8 {
        match sq {
            0 => WHITE_QUEENSIDE,
            4 => WHITE_KINGSIDE | WHITE_QUEENSIDE,
            7 => WHITE_KINGSIDE,
            56 => BLACK_QUEENSIDE,
            60 => BLACK_KINGSIDE | BLACK_QUEENSIDE,
            63 => BLACK_KINGSIDE,
            _ => 0,
        }
    }
}

/// State needed to take back a move, returned by `Board::make_move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undo {
    moved: PieceType,
    captured: Option<PieceType>,
    castling_rights: u8,
    en_passant: Option<u8>,
    halfmove_clock: u32,
    hash: u64,
}

/// State needed to take back a null move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullUndo {
    en_passant: Option<u8>,
    hash: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    /// pieces[color][piece_type]
    pieces: [[u64; 6]; 2],
    /// Aggregate occupancy per color
    occupancy: [u64; 2],
    active_color: Color,
    castling_rights: u8,
    en_passant: Option<u8>,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard starting position
    pub fn new() -> Board {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut board = Board::empty();
        for (file, &piece) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            board.put_piece(Color::White, piece, file);
            board.put_piece(Color::White, PieceType::Pawn, 8 + file);
            board.put_piece(Color::Black, PieceType::Pawn, 48 + file);
            board.put_piece(Color::Black, piece, 56 + file);
        }
        board.castling_rights = castling::ALL;
        board.hash = board.compute_hash();
        board
    }

    fn empty() -> Board {
        Board {
            pieces: [[0; 6]; 2],
            occupancy: [0; 2],
            active_color: Color::White,
            castling_rights: 0,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }

    /// Parse a position in Forsyth-Edwards notation.
    /// The two move counters may be omitted and default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Board> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 && fields.len() != 4 {
            return Err(ChessError::FenFieldCount(fields.len()));
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::FenPlacement(fields[0].to_string()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file = file.saturating_add(skip as u8);
                } else {
                    let piece = PieceType::from_char(c)
                        .ok_or_else(|| ChessError::FenPlacement(fields[0].to_string()))?;
                    if file >= 8 {
                        return Err(ChessError::FenPlacement(fields[0].to_string()));
                    }
                    let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                    board.put_piece(color, piece, rank * 8 + file);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(ChessError::FenPlacement(fields[0].to_string()));
            }
        }

        for color in [Color::White, Color::Black] {
            if board.get_piece_bb(color, PieceType::King).count_ones() != 1 {
                return Err(ChessError::KingCount(color.to_human()));
            }
        }

        let mut side = fields[1].chars();
        board.active_color = match (side.next().and_then(Color::from_char), side.next()) {
            (Some(color), None) => color,
            _ => return Err(ChessError::FenSideToMove(fields[1].to_string())),
        };

        if fields[2] != "-" {
            for c in fields[2].chars() {
                board.castling_rights |= match c {
                    'K' => castling::WHITE_KINGSIDE,
                    'Q' => castling::WHITE_QUEENSIDE,
                    'k' => castling::BLACK_KINGSIDE,
                    'q' => castling::BLACK_QUEENSIDE,
                    _ => return Err(ChessError::FenCastling(fields[2].to_string())),
                };
            }
        }

        board.en_passant = match fields[3] {
            "-" => None,
            s => match parse_square(s) {
                Some(sq) if board.is_en_passant_target(sq) => Some(sq),
                _ => return Err(ChessError::FenEnPassant(s.to_string())),
            },
        };

        if fields.len() == 6 {
            board.halfmove_clock = fields[4]
                .parse()
                .map_err(|_| ChessError::FenCounter(fields[4].to_string()))?;
            board.fullmove_number = fields[5]
                .parse()
                .map_err(|_| ChessError::FenCounter(fields[5].to_string()))?;
        }

        board.hash = board.compute_hash();
        Ok(board)
    }

    /// A target square must sit behind an enemy pawn that just made a double push: the
    /// target and the pawn's start square are empty and the pawn stands in front.
    fn is_en_passant_target(&self, sq: u8) -> bool {
        let them = self.active_color.other();
        let (rank, pawn_sq, start_sq) = match self.active_color {
            Color::White => (5, sq.wrapping_sub(8), sq.wrapping_add(8)),
            Color::Black => (2, sq.wrapping_add(8), sq.wrapping_sub(8)),
        };
        sq_rank(sq) == rank
            && self.piece_at(sq).is_none()
            && self.piece_at(start_sq).is_none()
            && self.piece_at(pawn_sq) == Some((them, PieceType::Pawn))
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(rank * 8 + file) {
                    Some((color, piece)) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece_symbol(color, piece));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        let side = match self.active_color {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut rights: String = [
            (castling::WHITE_KINGSIDE, 'K'),
            (castling::WHITE_QUEENSIDE, 'Q'),
            (castling::BLACK_KINGSIDE, 'k'),
            (castling::BLACK_QUEENSIDE, 'q'),
        ]
        .iter()
        .filter(|(bit, _)| self.castling_rights & bit != 0)
        .map(|(_, c)| *c)
        .collect();
        if rights.is_empty() {
            rights.push('-');
        }

        let en_passant = self.en_passant.map_or("-".to_string(), square_name);

        format!(
            "{} {} {} {} {} {}",
            placement, side, rights, en_passant, self.halfmove_clock, self.fullmove_number
        )
    }

    #[inline(always)]
    pub fn get_piece_bb(&self, color: Color, piece: PieceType) -> u64 {
        self.pieces[color.index()][piece.index()]
    }

    #[inline(always)]
    pub fn get_color_bb(&self, color: Color) -> u64 {
        self.occupancy[color.index()]
    }

    #[inline(always)]
    pub fn get_occupied(&self) -> u64 {
        self.occupancy[0] | self.occupancy[1]
    }

    /// Get the color of the side to move
    #[inline(always)]
    pub fn get_active_color(&self) -> Color {
        self.active_color
    }

    #[inline(always)]
    pub fn en_passant(&self) -> Option<u8> {
        self.en_passant
    }

    #[inline(always)]
    pub fn castling_rights(&self) -> u8 {
        self.castling_rights
    }

    #[inline(always)]
    pub fn has_castling_right(&self, right: u8) -> bool {
        self.castling_rights & right != 0
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Incrementally maintained position hash
    #[inline(always)]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Recompute the position hash from scratch
    pub fn compute_hash(&self) -> u64 {
        let keys = &*ZOBRIST_KEYS;
        let mut hash = 0;
        for color in [Color::White, Color::Black] {
            for piece in PieceType::ALL {
                for sq in BitboardIter(self.get_piece_bb(color, piece)) {
                    hash ^= keys.piece(color, piece, sq);
                }
            }
        }
        if self.active_color == Color::Black {
            hash ^= keys.side_to_move;
        }
        hash ^= keys.castling_rights(self.castling_rights);
        if let Some(sq) = self.en_passant {
            hash ^= keys.en_passant_square(sq);
        }
        hash
    }

    pub fn piece_at(&self, sq: u8) -> Option<(Color, PieceType)> {
        [Color::White, Color::Black].into_iter().find_map(|color| {
            self.piece_type_at(color, sq).map(|piece| (color, piece))
        })
    }

    #[inline]
    pub fn piece_type_at(&self, color: Color, sq: u8) -> Option<PieceType> {
        let bb = sq_to_bb(sq);
        if self.occupancy[color.index()] & bb == 0 {
            return None;
        }
        PieceType::ALL
            .into_iter()
            .find(|&piece| self.pieces[color.index()][piece.index()] & bb != 0)
    }

    #[inline(always)]
    pub fn king_square(&self, color: Color) -> u8 {
        self.get_piece_bb(color, PieceType::King).trailing_zeros() as u8
    }

    /// Hand the move to the other side without touching anything else
    #[inline]
    pub fn switch_active_color(&mut self) {
        self.active_color = self.active_color.other();
        self.hash ^= ZOBRIST_KEYS.side_to_move;
    }

    #[inline(always)]
    fn put_piece(&mut self, color: Color, piece: PieceType, sq: u8) {
        let bb = sq_to_bb(sq);
        self.pieces[color.index()][piece.index()] |= bb;
        self.occupancy[color.index()] |= bb;
        self.hash ^= ZOBRIST_KEYS.piece(color, piece, sq);
    }

    #[inline(always)]
    fn remove_piece(&mut self, color: Color, piece: PieceType, sq: u8) {
        let bb = sq_to_bb(sq);
        self.pieces[color.index()][piece.index()] &= !bb;
        self.occupancy[color.index()] &= !bb;
        self.hash ^= ZOBRIST_KEYS.piece(color, piece, sq);
    }

    #[inline(always)]
    fn move_piece(&mut self, color: Color, piece: PieceType, from: u8, to: u8) {
        self.remove_piece(color, piece, from);
        self.put_piece(color, piece, to);
    }

    fn set_en_passant(&mut self, sq: Option<u8>) {
        if let Some(old) = self.en_passant {
            self.hash ^= ZOBRIST_KEYS.en_passant_square(old);
        }
        if let Some(new) = sq {
            self.hash ^= ZOBRIST_KEYS.en_passant_square(new);
        }
        self.en_passant = sq;
    }

    fn set_castling_rights(&mut self, rights: u8) {
        self.hash ^= ZOBRIST_KEYS.castling_rights(self.castling_rights ^ rights);
        self.castling_rights = rights;
    }

    /// Square of the pawn removed by an en passant capture landing on `to`
    #[inline(always)]
    fn en_passant_victim(color: Color, to: u8) -> u8 {
        match color {
            Color::White => to - 8,
            Color::Black => to + 8,
        }
    }

    /// Apply a pseudo-legal move for the side to move.
    ///
    /// # Panics
    ///
    /// If `mv.from` does not hold a piece of the side to move. Moves from the generator
    /// for this position always do.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let us = self.active_color;
        let them = us.other();
        let moved = self
            .piece_type_at(us, mv.from)
            .expect("move source square holds a piece of the side to move");

        let mut undo = Undo {
            moved,
            captured: None,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
        };

        if mv.is_en_passant() {
            self.remove_piece(them, PieceType::Pawn, Self::en_passant_victim(us, mv.to));
            undo.captured = Some(PieceType::Pawn);
        } else if let Some(victim) = self.piece_type_at(them, mv.to) {
            self.remove_piece(them, victim, mv.to);
            undo.captured = Some(victim);
        }

        self.remove_piece(us, moved, mv.from);
        self.put_piece(us, mv.promotion().unwrap_or(moved), mv.to);

        let geometry = CastlingGeometry::for_color(us);
        if mv.flags.contains(MoveFlags::CASTLE_KINGSIDE) {
            self.move_piece(us, PieceType::Rook, geometry.kingside_rook_from, geometry.kingside_rook_to);
        } else if mv.flags.contains(MoveFlags::CASTLE_QUEENSIDE) {
            self.move_piece(us, PieceType::Rook, geometry.queenside_rook_from, geometry.queenside_rook_to);
        }

        let rights = self.castling_rights
            & !castling::lost_by_touching(mv.from)
            & !castling::lost_by_touching(mv.to);
        self.set_castling_rights(rights);

        let en_passant = mv.is_double_push().then(|| (mv.from + mv.to) / 2);
        self.set_en_passant(en_passant);

        if moved == PieceType::Pawn || undo.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.switch_active_color();
        undo
    }

    /// Take back `mv`, which must be the last move made with `make_move`.
    pub fn undo_move(&mut self, mv: Move, undo: Undo) {
        self.active_color = self.active_color.other();
        let us = self.active_color;
        let them = us.other();

        if us == Color::Black {
            self.fullmove_number -= 1;
        }

        self.remove_piece(us, mv.promotion().unwrap_or(undo.moved), mv.to);
        self.put_piece(us, undo.moved, mv.from);

        let geometry = CastlingGeometry::for_color(us);
        if mv.flags.contains(MoveFlags::CASTLE_KINGSIDE) {
            self.move_piece(us, PieceType::Rook, geometry.kingside_rook_to, geometry.kingside_rook_from);
        } else if mv.flags.contains(MoveFlags::CASTLE_QUEENSIDE) {
            self.move_piece(us, PieceType::Rook, geometry.queenside_rook_to, geometry.queenside_rook_from);
        }

        if let Some(victim) = undo.captured {
            let sq = if mv.is_en_passant() {
                Self::en_passant_victim(us, mv.to)
            } else {
                mv.to
            };
            self.put_piece(them, victim, sq);
        }

        self.castling_rights = undo.castling_rights;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.hash = undo.hash;
    }

    /// Pass the move: flip the side to move and clear the en passant target.
    pub fn make_null_move(&mut self) -> NullUndo {
        let undo = NullUndo {
            en_passant: self.en_passant,
            hash: self.hash,
        };
        self.set_en_passant(None);
        self.switch_active_color();
        undo
    }

    pub fn undo_null_move(&mut self, undo: NullUndo) {
        self.active_color = self.active_color.other();
        self.en_passant = undo.en_passant;
        self.hash = undo.hash;
    }

    pub fn draw_board(&self) -> String {
        let mut string = String::new();
        for rank in (0..8u8).rev() {
            string.push((b'1' + rank) as char);
            for file in 0..8u8 {
                string.push(' ');
                string.push(
                    self.piece_at(rank * 8 + file)
                        .map_or('.', |(color, piece)| piece_symbol(color, piece)),
                );
            }
            string.push('\n');
        }
        string.push_str("  a b c d e f g h\n");
        string
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.draw_board())
    }
}

fn piece_symbol(color: Color, piece: PieceType) -> char {
    match color {
        Color::White => piece.to_char(),
        Color::Black => piece.to_char().to_ascii_lowercase(),
    }
}
