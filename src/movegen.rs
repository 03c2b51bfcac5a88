//! Pseudo-legal move generation and the make/undo legality filter.
//!
//! Generation order is fixed: pawns, knights, king, rooks, bishops, queens, castling.
//! Ordering for search happens later, in the searcher.

use crate::bitboard::{
    sq_to_bb, AttackTables, BitboardIter, Direction, BISHOP_DIRECTIONS, FILE_A, FILE_H, RANK_1,
    RANK_3, RANK_6, RANK_8, ROOK_DIRECTIONS,
};
use crate::board::{castling, Board};
use crate::error::{ChessError, Result};
use crate::movelist::MoveList;
use crate::types::{Color, Move, MoveFlags, PieceType, UciMove, PROMOTION_PIECES};

/// Shift a bitboard by a signed square offset
#[inline(always)]
fn shift(bb: u64, step: i8) -> u64 {
    if step >= 0 {
        bb << step
    } else {
        bb >> -step
    }
}

/// Pawn geometry for one color.
struct PawnDirs {
    push: i8,
    /// (step, mask of pawns allowed to take that step)
    captures: [(i8, u64); 2],
    double_push_rank: u64,
    promotion_rank: u64,
}

const fn pawn_dirs(color: Color) -> PawnDirs {
    match color {
        Color::White => PawnDirs {
            push: 8,
            captures: [(9, !FILE_H), (7, !FILE_A)],
            double_push_rank: RANK_3,
            promotion_rank: RANK_8,
        },
        Color::Black => PawnDirs {
            push: -8,
            captures: [(-9, !FILE_A), (-7, !FILE_H)],
            double_push_rank: RANK_6,
            promotion_rank: RANK_1,
        },
    }
}

/// Which moves a generation pass emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenMode {
    All,
    Captures,
}

pub struct MoveGenerator<'a> {
    tables: &'a AttackTables,
}

impl<'a> MoveGenerator<'a> {
    #[inline(always)]
    pub fn new(tables: &'a AttackTables) -> Self {
        Self { tables }
    }

    /// Append every pseudo-legal move for the side to move. King safety is not checked.
    pub fn generate_pseudo_legal_moves(&self, board: &Board, list: &mut MoveList) {
        self.generate(board, list, GenMode::All);
    }

    /// Append the pseudo-legal captures (en passant and capturing promotions included).
    pub fn generate_pseudo_legal_captures(&self, board: &Board, list: &mut MoveList) {
        self.generate(board, list, GenMode::Captures);
    }

    /// Append every legal move. The board is mutated while each candidate is tried and is
    /// back in its input state on return.
    pub fn generate_legal_moves(&self, board: &mut Board, list: &mut MoveList) {
        let start = list.len();
        self.generate_pseudo_legal_moves(board, list);
        self.retain_legal(board, list, start);
    }

    /// Append the legal captures
    pub fn generate_legal_captures(&self, board: &mut Board, list: &mut MoveList) {
        let start = list.len();
        self.generate_pseudo_legal_captures(board, list);
        self.retain_legal(board, list, start);
    }

    /// Legal moves of a position, leaving the caller's board untouched
    pub fn legal_moves(&self, board: &Board) -> Vec<Move> {
        let mut scratch = *board;
        let mut list = MoveList::new();
        self.generate_legal_moves(&mut scratch, &mut list);
        list.iter().collect()
    }

    /// Resolve a move in coordinate notation against the legal moves of `board`
    pub fn parse_uci_move(&self, board: &Board, text: &str) -> Result<Move> {
        let uci = UciMove::parse(text).ok_or_else(|| ChessError::MoveSyntax(text.to_string()))?;
        self.legal_moves(board)
            .into_iter()
            .find(|mv| uci.matches(mv))
            .ok_or_else(|| ChessError::IllegalMove(text.to_string()))
    }

    /// Every square attacked by `color`
    pub fn attacks_by(&self, board: &Board, color: Color) -> u64 {
        let occupied = board.get_occupied();
        let mut attacks = 0;

        let pawns = board.get_piece_bb(color, PieceType::Pawn);
        for (step, mask) in pawn_dirs(color).captures {
            attacks |= shift(pawns & mask, step);
        }

        for sq in BitboardIter(board.get_piece_bb(color, PieceType::Knight)) {
            attacks |= self.tables.knight[sq as usize];
        }
        for sq in BitboardIter(board.get_piece_bb(color, PieceType::King)) {
            attacks |= self.tables.king[sq as usize];
        }

        let queens = board.get_piece_bb(color, PieceType::Queen);
        for sq in BitboardIter(board.get_piece_bb(color, PieceType::Rook) | queens) {
            attacks |= self.tables.rook_attacks(sq, occupied);
        }
        for sq in BitboardIter(board.get_piece_bb(color, PieceType::Bishop) | queens) {
            attacks |= self.tables.bishop_attacks(sq, occupied);
        }

        attacks
    }

    /// Whether the side to move has its king attacked
    pub fn in_check(&self, board: &Board) -> bool {
        let us = board.get_active_color();
        self.attacks_by(board, us.other()) & board.get_piece_bb(us, PieceType::King) != 0
    }

    /// Whether the side that just moved left its own king safe
    pub fn is_legal(&self, board: &Board) -> bool {
        let mover = board.get_active_color().other();
        self.attacks_by(board, mover.other()) & board.get_piece_bb(mover, PieceType::King) == 0
    }

    /// Keep only the moves from `start` on that do not leave the mover's king attacked
    fn retain_legal(&self, board: &mut Board, list: &mut MoveList, start: usize) {
        let mut idx = 0;
        list.retain(|mv| {
            idx += 1;
            if idx <= start {
                return true;
            }
            let undo = board.make_move(mv);
            let legal = self.is_legal(board);
            board.undo_move(mv, undo);
            legal
        });
    }

    fn generate(&self, board: &Board, list: &mut MoveList, mode: GenMode) {
        let us = board.get_active_color();
        let own = board.get_color_bb(us);
        let enemy = board.get_color_bb(us.other());

        self.generate_pawn_moves(board, list, mode);

        for sq in BitboardIter(board.get_piece_bb(us, PieceType::Knight)) {
            self.push_targets(list, sq, self.tables.knight[sq as usize] & !own, enemy, mode);
        }
        for sq in BitboardIter(board.get_piece_bb(us, PieceType::King)) {
            self.push_targets(list, sq, self.tables.king[sq as usize] & !own, enemy, mode);
        }

        self.generate_slider_moves(board, list, PieceType::Rook, &ROOK_DIRECTIONS, mode);
        self.generate_slider_moves(board, list, PieceType::Bishop, &BISHOP_DIRECTIONS, mode);
        self.generate_slider_moves(board, list, PieceType::Queen, &ROOK_DIRECTIONS, mode);
        self.generate_slider_moves(board, list, PieceType::Queen, &BISHOP_DIRECTIONS, mode);

        if mode == GenMode::All {
            self.generate_castling_moves(board, list);
        }
    }

    /// Split reachable squares into captures and quiet moves
    #[inline]
    fn push_targets(&self, list: &mut MoveList, from: u8, targets: u64, enemy: u64, mode: GenMode) {
        for to in BitboardIter(targets & enemy) {
            list.push(Move::new(from, to, MoveFlags::CAPTURE));
        }
        if mode == GenMode::All {
            for to in BitboardIter(targets & !enemy) {
                list.push(Move::new(from, to, MoveFlags::QUIET));
            }
        }
    }

    fn generate_slider_moves(
        &self,
        board: &Board,
        list: &mut MoveList,
        piece: PieceType,
        directions: &[Direction; 4],
        mode: GenMode,
    ) {
        let us = board.get_active_color();
        let own = board.get_color_bb(us);
        let enemy = board.get_color_bb(us.other());

        for from in BitboardIter(board.get_piece_bb(us, piece)) {
            for &dir in directions {
                let reach = self.tables.slide(from, dir, own, enemy);
                self.push_targets(list, from, reach, enemy, mode);
            }
        }
    }

    fn generate_pawn_moves(&self, board: &Board, list: &mut MoveList, mode: GenMode) {
        let us = board.get_active_color();
        let dirs = pawn_dirs(us);
        let pawns = board.get_piece_bb(us, PieceType::Pawn);
        let enemy = board.get_color_bb(us.other());
        let empty = !board.get_occupied();

        if mode == GenMode::All {
            let single = shift(pawns, dirs.push) & empty;
            let double = shift(single & dirs.double_push_rank, dirs.push) & empty;

            for to in BitboardIter(single & !dirs.promotion_rank) {
                list.push(Move::new((to as i8 - dirs.push) as u8, to, MoveFlags::QUIET));
            }
            for to in BitboardIter(single & dirs.promotion_rank) {
                push_promotions(list, (to as i8 - dirs.push) as u8, to, MoveFlags::QUIET);
            }
            for to in BitboardIter(double) {
                list.push(Move::new((to as i8 - 2 * dirs.push) as u8, to, MoveFlags::DOUBLE_PUSH));
            }
        }

        for (step, mask) in dirs.captures {
            let targets = shift(pawns & mask, step) & enemy;
            for to in BitboardIter(targets & !dirs.promotion_rank) {
                list.push(Move::new((to as i8 - step) as u8, to, MoveFlags::CAPTURE));
            }
            for to in BitboardIter(targets & dirs.promotion_rank) {
                push_promotions(list, (to as i8 - step) as u8, to, MoveFlags::CAPTURE);
            }
        }

        if let Some(ep) = board.en_passant() {
            let ep_bb = sq_to_bb(ep);
            for (step, mask) in dirs.captures {
                // A pawn on `ep - step` reaches `ep` only if it may take that step
                if shift(ep_bb, -step) & pawns & mask != 0 {
                    list.push(Move::new(
                        (ep as i8 - step) as u8,
                        ep,
                        MoveFlags::CAPTURE | MoveFlags::EN_PASSANT,
                    ));
                }
            }
        }
    }

    fn generate_castling_moves(&self, board: &Board, list: &mut MoveList) {
        let us = board.get_active_color();
        let kingside = board.has_castling_right(castling::kingside(us));
        let queenside = board.has_castling_right(castling::queenside(us));
        if !kingside && !queenside {
            return;
        }

        let geometry = self.tables.castling(us);
        let rooks = board.get_piece_bb(us, PieceType::Rook);
        if board.get_piece_bb(us, PieceType::King) & sq_to_bb(geometry.king_from) == 0 {
            return;
        }

        let attacked = self.attacks_by(board, us.other());
        if attacked & sq_to_bb(geometry.king_from) != 0 {
            return;
        }
        let occupied = board.get_occupied();

        if kingside
            && rooks & sq_to_bb(geometry.kingside_rook_from) != 0
            && geometry.kingside_path & (occupied | attacked) == 0
        {
            list.push(Move::new(
                geometry.king_from,
                geometry.kingside_king_to,
                MoveFlags::CASTLE_KINGSIDE,
            ));
        }

        if queenside
            && rooks & sq_to_bb(geometry.queenside_rook_from) != 0
            && geometry.queenside_path & (occupied | attacked) == 0
            && geometry.queenside_rook_transit & occupied == 0
        {
            list.push(Move::new(
                geometry.king_from,
                geometry.queenside_king_to,
                MoveFlags::CASTLE_QUEENSIDE,
            ));
        }
    }
}

#[inline]
fn push_promotions(list: &mut MoveList, from: u8, to: u8, extra: MoveFlags) {
    for piece in PROMOTION_PIECES {
        list.push(Move::new(from, to, MoveFlags::promotion(piece) | extra));
    }
}
