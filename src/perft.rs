use itertools::Itertools;
use rayon::prelude::*;

use crate::bitboard::AttackTables;
use crate::board::Board;
use crate::movegen::MoveGenerator;
use crate::movelist::MoveList;
use crate::types::Move;

/// Count the leaf nodes of the legal move tree to `depth`.
pub fn perft(tables: &AttackTables, board: &Board, depth: u32) -> u64 {
    let movegen = MoveGenerator::new(tables);
    let mut scratch = *board;
    count_nodes(&movegen, &mut scratch, depth)
}

/// Per-root-move node counts, sorted by move text. Root moves are counted in parallel.
pub fn perft_divide(tables: &AttackTables, board: &Board, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let movegen = MoveGenerator::new(tables);
    movegen
        .legal_moves(board)
        .into_par_iter()
        .map(|mv| {
            let mut child = *board;
            child.make_move(mv);
            (mv, count_nodes(&movegen, &mut child, depth - 1))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .sorted_by_key(|(mv, _)| mv.to_uci())
        .collect()
}

fn count_nodes(movegen: &MoveGenerator, board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    movegen.generate_legal_moves(board, &mut list);
    if depth == 1 {
        return list.len() as u64;
    }

    let mut nodes = 0;
    for mv in &list {
        let undo = board.make_move(mv);
        nodes += count_nodes(movegen, board, depth - 1);
        board.undo_move(mv, undo);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check(fen: &str, expected: &[u64]) {
        let tables = AttackTables::new();
        let board = Board::from_fen(fen).unwrap();
        for (depth, &nodes) in expected.iter().enumerate() {
            let depth = depth as u32 + 1;
            assert_eq!(perft(&tables, &board, depth), nodes, "{fen} depth {depth}");
        }
    }

    /// Perft from starting position
    ///
    /// https://www.chessprogramming.org/Perft_Results
    ///
    /// | Depth | Nodes     | Captures | E.p. | Castles | Promotions | Checks | Checkmates |
    /// | ----- | --------- | -------- | ---- | ------- | ---------- | ------ | ---------- |
    /// | 1     | 20        | 0        | 0    | 0       | 0          | 0      | 0          |
    /// | 2     | 400       | 0        | 0    | 0       | 0          | 0      | 0          |
    /// | 3     | 8,902     | 34       | 0    | 0       | 0          | 12     | 0          |
    /// | 4     | 197,281   | 1576     | 0    | 0       | 0          | 469    | 8          |
    /// | 5     | 4,865,609 | 82,719   | 258  | 0       | 0          | 27,351 | 347        |
    #[test]
    fn perft_start() {
        check(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            &[20, 400, 8_902, 197_281],
        );
    }

    /// "Kiwipete", heavy on castling, pins and en passant
    ///
    /// Depth | Nodes
    /// ----- | -----
    /// 1     | 48
    /// 2     | 2,039
    /// 3     | 97,862
    /// 4     | 4,085,603
    #[test]
    fn perft_kiwipete() {
        check(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            &[48, 2_039, 97_862],
        );
    }

    /// Position 3: rook endgame with discovered checks and en passant pins
    #[test]
    fn perft_pos_3() {
        check("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", &[14, 191, 2_812, 43_238]);
    }

    /// Position 4: promotions, including promotion captures
    #[test]
    fn perft_pos_4() {
        check(
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            &[6, 264, 9_467],
        );
    }

    /// Run the perft test on the "position 5" from
    /// https://www.chessprogramming.org/Perft_Results
    ///
    /// Depth | Nodes
    /// ----- | -----
    /// 1     | 44
    /// 2     | 1,486
    /// 3     | 62,379
    /// 4     | 2,103,487
    /// 5     | 89,941,194
    #[test]
    fn perft_pos_5() {
        check(
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            &[44, 1_486, 62_379],
        );
    }

    #[test]
    fn perft_depth_zero_is_one() {
        let tables = AttackTables::new();
        assert_eq!(perft(&tables, &Board::new(), 0), 1);
        assert!(perft_divide(&tables, &Board::new(), 0).is_empty());
    }

    #[test]
    fn perft_divide_sums_to_perft() {
        let tables = AttackTables::new();
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let divided = perft_divide(&tables, &board, 2);
        assert_eq!(divided.len(), 48);
        assert_eq!(divided.iter().map(|(_, n)| n).sum::<u64>(), 2_039);

        let names: Vec<String> = divided.iter().map(|(mv, _)| mv.to_uci()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
