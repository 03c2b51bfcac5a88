use crate::bitboard::{sq_file, sq_rank, BitboardIter};
use crate::board::Board;
use crate::types::{Color, Move, PieceType};

/// Static position scoring consumed by the searcher.
///
/// Both methods score from the point of view of the side to move.
pub trait Evaluator {
    /// Signed score of the position, positive when the side to move is better
    fn evaluate(&self, board: &Board) -> i32;

    /// Heuristic promise of a move, higher is tried first
    fn score_move(&self, board: &Board, mv: Move) -> i32;
}

/// Maximum game phase value (all minor and major pieces on board)
/// Queens = 4, Rooks = 2, Bishops = 1, Knights = 1
/// Total: 2*4 + 4*2 + 4*1 + 4*1 = 24
pub const MAX_PHASE: i32 = 24;

pub fn piece_value(piece: PieceType) -> i32 {
    match piece {
        PieceType::Pawn => 100,
        PieceType::Knight => 300,
        PieceType::Bishop => 320,
        PieceType::Rook => 500,
        PieceType::Queen => 900,
        PieceType::King => 0,
    }
}

fn piece_phase(piece: PieceType) -> i32 {
    match piece {
        PieceType::Knight | PieceType::Bishop => 1,
        PieceType::Rook => 2,
        PieceType::Queen => 4,
        PieceType::Pawn | PieceType::King => 0,
    }
}

/// Material plus piece-square tables, tapered between middlegame and endgame tables for
/// pawns and kings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PieceSquareEvaluator;

impl PieceSquareEvaluator {
    pub fn new() -> Self {
        PieceSquareEvaluator
    }

    /// (middlegame, endgame) score for white minus black, plus the game phase
    fn white_relative(&self, board: &Board) -> (i32, i32, i32) {
        let mut mg = 0;
        let mut eg = 0;
        let mut phase = 0;

        for color in [Color::White, Color::Black] {
            let sign = if color == Color::White { 1 } else { -1 };
            for piece in PieceType::ALL {
                for sq in BitboardIter(board.get_piece_bb(color, piece)) {
                    let material = piece_value(piece);
                    mg += sign * (material + pst_value(piece, color, sq, false));
                    eg += sign * (material + pst_value(piece, color, sq, true));
                    phase += piece_phase(piece);
                }
            }
        }

        (mg, eg, phase.min(MAX_PHASE))
    }
}

impl Evaluator for PieceSquareEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        let (mg, eg, phase) = self.white_relative(board);
        let score = (mg * phase + eg * (MAX_PHASE - phase)) / MAX_PHASE;

        if board.get_active_color() == Color::White {
            score
        } else {
            -score
        }
    }

    fn score_move(&self, board: &Board, mv: Move) -> i32 {
        let us = board.get_active_color();
        let Some(piece) = board.piece_type_at(us, mv.from) else {
            return 0;
        };
        let material_difference_multiplier = 10;

        let victim = if mv.is_en_passant() {
            Some(PieceType::Pawn)
        } else {
            board.piece_type_at(us.other(), mv.to)
        };

        let mut score = match victim {
            Some(victim) => {
                material_difference_multiplier * (piece_value(victim) - piece_value(piece))
            }
            None => pst_value(piece, us, mv.to, false) - pst_value(piece, us, mv.from, false),
        };

        // Promotion bonus equal to the value gained
        if let Some(promoted) = mv.promotion() {
            score += piece_value(promoted) - piece_value(PieceType::Pawn);
        }

        score
    }
}

/// Piece-square value for `piece` of `color` standing on `sq`
pub fn pst_value(piece: PieceType, color: Color, sq: u8, is_endgame: bool) -> i32 {
    let (rank, file) = (sq_rank(sq) as usize, sq_file(sq) as usize);
    // Tables are laid out with rank 8 first, as seen by white
    let index = match color {
        Color::White => (7 - rank) * 8 + file,
        Color::Black => rank * 8 + file,
    };
    raw_pst_table(piece, is_endgame)[index]
}

fn raw_pst_table(piece: PieceType, is_endgame: bool) -> &'static [i32; 64] {
    match (piece, is_endgame) {
        (PieceType::Pawn, false) => &PAWNS,
        (PieceType::Pawn, true) => &PAWNS_END,
        (PieceType::Knight, _) => &KNIGHTS,
        (PieceType::Bishop, _) => &BISHOPS,
        (PieceType::Rook, _) => &ROOKS,
        (PieceType::Queen, _) => &QUEENS,
        (PieceType::King, false) => &KING_START,
        (PieceType::King, true) => &KING_END,
    }
}

#[rustfmt::skip]
const PAWNS: [i32; 64] = [
     0,  0,   0,   0,   0,   0,  0,  0,
    50, 50,  50,  50,  50,  50, 50, 50,
    10, 10,  20,  30,  30,  20, 10, 10,
     5,  5,  10,  25,  25,  10,  5,  5,
     0,  0,   0,  20,  20,   0,  0,  0,
     5, -5, -10,   0,   0, -10, -5,  5,
     5, 10,  10, -20, -20,  10, 10,  5,
     0,  0,   0,   0,   0,   0,  0,  0,
];

#[rustfmt::skip]
const PAWNS_END: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    80, 80, 80, 80, 80, 80, 80, 80,
    50, 50, 50, 50, 50, 50, 50, 50,
    30, 30, 30, 30, 30, 30, 30, 30,
    20, 20, 20, 20, 20, 20, 20, 20,
    10, 10, 10, 10, 10, 10, 10, 10,
    10, 10, 10, 10, 10, 10, 10, 10,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHTS: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOPS: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOKS: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEENS: [i32; 64] = [
    -20, -10, -10, -5, -5, -10, -10, -20,
    -10,   0,   0,  0,  0,   0,   0, -10,
    -10,   0,   5,  5,  5,   5,   0, -10,
     -5,   0,   5,  5,  5,   5,   0,  -5,
      0,   0,   5,  5,  5,   5,   0,  -5,
    -10,   5,   5,  5,  5,   5,   0, -10,
    -10,   0,   5,  0,  0,   0,   0, -10,
    -20, -10, -10, -5, -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_START: [i32; 64] = [
    -80, -70, -70, -70, -70, -70, -70, -80,
    -60, -60, -60, -60, -60, -60, -60, -60,
    -40, -50, -50, -60, -60, -50, -50, -40,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20, -15, -15, -15,  -5,  20,  20,
     20,  30,  10, -10,   0,  10,  30,  20,
];

#[rustfmt::skip]
const KING_END: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,  -5,  20,  30,  30,  20,  -5, -10,
    -15, -10,  35,  45,  45,  35, -10, -15,
    -20, -15,  30,  40,  40,  30, -15, -20,
    -25, -20,  20,  25,  25,  20, -20, -25,
    -30, -25,   0,   0,   0,   0, -25, -30,
    -50, -30, -30, -30, -30, -30, -30, -50,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::parse_square;
    use crate::types::MoveFlags;
    use pretty_assertions::assert_eq;

    fn sq(name: &str) -> u8 {
        parse_square(name).unwrap()
    }

    #[test]
    fn test_pst_is_mirrored_between_colors() {
        assert_eq!(
            pst_value(PieceType::Knight, Color::White, sq("f3"), false),
            pst_value(PieceType::Knight, Color::Black, sq("f6"), false)
        );
        assert_eq!(
            pst_value(PieceType::Pawn, Color::White, sq("d2"), false),
            pst_value(PieceType::Pawn, Color::Black, sq("d7"), false)
        );
        // White pawn one step from promotion sits on the 50 row
        assert_eq!(pst_value(PieceType::Pawn, Color::White, sq("a7"), false), 50);
    }

    #[test]
    fn test_start_position_is_balanced() {
        let eval = PieceSquareEvaluator::new();
        assert_eq!(eval.evaluate(&Board::new()), 0);
    }

    #[test]
    fn test_evaluation_is_side_relative() {
        let eval = PieceSquareEvaluator::new();
        let white = Board::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let black = Board::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1").unwrap();
        assert!(eval.evaluate(&white) > 800);
        assert_eq!(eval.evaluate(&white), -eval.evaluate(&black));
    }

    #[test]
    fn test_score_move_prefers_cheap_attacker_on_valuable_victim() {
        let eval = PieceSquareEvaluator::new();
        let board = Board::from_fen("4k3/8/8/3q4/4P3/8/8/3QK3 w - - 0 1").unwrap();
        let pawn_takes_queen = Move::new(sq("e4"), sq("d5"), MoveFlags::CAPTURE);
        let queen_takes_queen = Move::new(sq("d1"), sq("d5"), MoveFlags::CAPTURE);
        let quiet = Move::new(sq("e1"), sq("f1"), MoveFlags::QUIET);
        let a = eval.score_move(&board, pawn_takes_queen);
        let b = eval.score_move(&board, queen_takes_queen);
        let c = eval.score_move(&board, quiet);
        assert!(a > b);
        assert!(a > c);
    }

    #[test]
    fn test_score_move_promotion_bonus() {
        let eval = PieceSquareEvaluator::new();
        let board = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let queen = Move::new(sq("a7"), sq("a8"), MoveFlags::promotion(PieceType::Queen));
        let knight = Move::new(sq("a7"), sq("a8"), MoveFlags::promotion(PieceType::Knight));
        assert!(eval.score_move(&board, queen) > eval.score_move(&board, knight));
    }
}
