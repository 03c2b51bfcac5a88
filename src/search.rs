//! Iterative-deepening MTD(f) over a fail-hard negamax alpha-beta with null-move pruning,
//! quiescence search and a depth-preferred transposition table.
//!
//! The search walks a single board in place (make, recurse, undo) on the calling thread.
//! The only other thread is the timer that flips the shared cancellation flag.

use std::cmp::{max, min};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::bitboard::AttackTables;
use crate::board::Board;
use crate::evaluate::Evaluator;
use crate::movegen::MoveGenerator;
use crate::movelist::MoveList;
use crate::tt::{Bound, TranspositionTable, MAX_TT_BITS};
use crate::types::Move;

/// Larger than any reachable score; also the "illegal position" sentinel
pub const INF: i32 = 1 << 25;
/// Score of being checkmated at the root, adjusted by ply
pub const MATE: i32 = 1_000_000;
/// Iterative deepening never goes past this depth
pub const MAX_DEPTH: i32 = 64;

/// Shared flag telling a running search to wind down.
///
/// Cloning shares the flag. It is set once and only ever read by the search thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    stop: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Start a detached timer thread that cancels the token after `duration`.
    /// The timer cannot be called off; it always fires once.
    pub fn cancel_after(&self, duration: Duration) {
        let token = self.clone();
        thread::spawn(move || {
            thread::sleep(duration);
            token.cancel();
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Wall-clock budget per move
    pub time_limit: Duration,
    /// The transposition table holds `1 << tt_bits` entries
    pub tt_bits: u32,
    /// Upper bound on iterative deepening
    pub max_depth: i32,
    pub use_book: bool,
    pub null_move_pruning: bool,
    pub use_transposition_table: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            time_limit: Duration::from_millis(1000),
            tt_bits: 20,
            max_depth: MAX_DEPTH,
            use_book: true,
            null_move_pruning: true,
            use_transposition_table: true,
        }
    }
}

impl SearchConfig {
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Capped at `MAX_TT_BITS`
    pub fn with_tt_bits(mut self, bits: u32) -> Self {
        self.tt_bits = bits.min(MAX_TT_BITS);
        self
    }

    pub fn with_max_depth(mut self, depth: i32) -> Self {
        self.max_depth = depth.clamp(1, MAX_DEPTH);
        self
    }

    pub fn with_book(mut self, use_book: bool) -> Self {
        self.use_book = use_book;
        self
    }

    pub fn with_null_move_pruning(mut self, enabled: bool) -> Self {
        self.null_move_pruning = enabled;
        self
    }

    pub fn with_transposition_table(mut self, enabled: bool) -> Self {
        self.use_transposition_table = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: i32,
    /// Deepest iteration that finished before cancellation
    pub depth: i32,
    pub nodes: u64,
    pub elapsed: Duration,
    pub from_book: bool,
}

impl SearchReport {
    pub fn book_move(mv: Move, elapsed: Duration) -> Self {
        SearchReport {
            best_move: Some(mv),
            score: 0,
            depth: 0,
            nodes: 0,
            elapsed,
            from_book: true,
        }
    }

    pub fn print(&self) {
        match self.best_move {
            Some(mv) => println!(
                "Search result: [{}, depth {}, nodes {}, {:.3}s{}] {}",
                self.score,
                self.depth,
                self.nodes,
                self.elapsed.as_secs_f32(),
                if self.from_book { ", book" } else { "" },
                mv
            ),
            None => println!("Search result: no legal move"),
        }
    }
}

/// One move-selection request: borrows everything it needs and walks the tree.
pub struct Searcher<'a, E: Evaluator> {
    movegen: MoveGenerator<'a>,
    evaluator: &'a E,
    tt: &'a mut TranspositionTable,
    config: &'a SearchConfig,
    token: CancellationToken,
    completed_depth: i32,
    nodes: u64,
    /// Best root move of the most recent root pass that raised alpha
    selected: Option<Move>,
}

impl<'a, E: Evaluator> Searcher<'a, E> {
    pub fn new(
        tables: &'a AttackTables,
        evaluator: &'a E,
        tt: &'a mut TranspositionTable,
        config: &'a SearchConfig,
        token: CancellationToken,
    ) -> Self {
        Searcher {
            movegen: MoveGenerator::new(tables),
            evaluator,
            tt,
            config,
            token,
            completed_depth: 0,
            nodes: 0,
            selected: None,
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Cancellation is only honoured once depth 1 has completed, so a move is always found.
    #[inline]
    fn should_stop(&self) -> bool {
        self.completed_depth >= 1 && self.token.is_cancelled()
    }

    /// Iterative deepening with an MTD(f) window search at each depth.
    /// The board is back in its input state on return.
    pub fn run(&mut self, board: &mut Board) -> SearchReport {
        let start = Instant::now();
        let mut best: Option<Move> = None;
        let mut best_score = 0;
        let mut score = 0;
        let mut depth = 1;

        while depth <= self.config.max_depth && !self.should_stop() {
            let mut upper = INF;
            let mut lower = -INF;
            let mut depth_best = None;

            while lower < upper && !self.should_stop() {
                let beta = max(score, lower + 1);
                self.selected = None;
                score = self.search_moves(board, depth, beta - 1, beta);
                if self.selected.is_some() {
                    depth_best = self.selected;
                }
                if score < beta {
                    upper = score;
                } else {
                    lower = score;
                }
            }

            if self.should_stop() {
                if depth_best.is_some() {
                    self.selected = depth_best;
                }
                break;
            }

            self.completed_depth = depth;
            if depth_best.is_some() {
                best = depth_best;
            }
            best_score = score;
            debug!(
                "depth {} score {} best {} nodes {}",
                depth,
                score,
                best.map_or("-".to_string(), |mv| mv.to_uci()),
                self.nodes
            );
            depth += 1;
        }

        let best_move = best.or(self.selected).or_else(|| {
            let fallback = self.first_ordered_move(board);
            if fallback.is_some() {
                warn!("no root move scored, falling back to first ordered move");
            }
            fallback
        });

        SearchReport {
            best_move,
            score: best_score,
            depth: self.completed_depth,
            nodes: self.nodes,
            elapsed: start.elapsed(),
            from_book: false,
        }
    }

    fn first_ordered_move(&self, board: &mut Board) -> Option<Move> {
        let mut list = MoveList::new();
        self.movegen.generate_legal_moves(board, &mut list);
        self.order_moves(board, &mut list);
        list.iter().next()
    }

    /// Root pass: like `alpha_beta` but remembers which move raised alpha.
    pub fn search_moves(&mut self, board: &mut Board, depth: i32, mut alpha: i32, beta: i32) -> i32 {
        let mut list = MoveList::new();
        self.movegen.generate_legal_moves(board, &mut list);
        self.order_moves(board, &mut list);

        let mut best = None;
        for mv in &list {
            if self.should_stop() {
                break;
            }
            let undo = board.make_move(mv);
            let eval = -self.alpha_beta(board, depth - 1, 1, -beta, -alpha);
            board.undo_move(mv, undo);

            if self.should_stop() {
                break;
            }
            if eval > alpha {
                alpha = eval;
                best = Some(mv);
            }
        }

        if best.is_some() {
            self.selected = best;
        }
        alpha
    }

    /// Fail-hard negamax. Scores are from the side to move's perspective.
    pub fn alpha_beta(
        &mut self,
        board: &mut Board,
        depth: i32,
        ply: i32,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        if self.should_stop() {
            return 0;
        }
        self.nodes += 1;

        if !self.movegen.is_legal(board) {
            return INF;
        }

        // Mate distance pruning
        if ply > 0 {
            alpha = max(alpha, -MATE + ply);
            beta = min(beta, MATE - ply);
            if alpha >= beta {
                return alpha;
            }
        }

        let key = board.hash();
        if self.config.use_transposition_table {
            if let Some((bound, value)) = self.tt.get(key, depth) {
                match bound {
                    Bound::Exact => return value,
                    Bound::Lower if value >= beta => return value,
                    Bound::Upper if value <= alpha => return value,
                    _ => {}
                }
            }
        }

        if depth <= 0 {
            let eval = self.quiescence(board, alpha, beta);
            self.store(key, eval, depth, Bound::Exact);
            return eval;
        }

        if self.config.null_move_pruning {
            let undo = board.make_null_move();
            let eval = -self.alpha_beta(board, depth - 2, ply + 2, -beta, -beta + 1);
            board.undo_null_move(undo);

            if self.should_stop() {
                return 0;
            }
            if eval >= beta {
                self.store(key, beta, depth, Bound::Lower);
                return beta;
            }
        }

        let mut list = MoveList::new();
        self.movegen.generate_legal_moves(board, &mut list);
        if list.is_empty() {
            return if self.movegen.in_check(board) { -MATE + ply } else { 0 };
        }

        self.order_moves(board, &mut list);
        for mv in &list {
            let undo = board.make_move(mv);
            let eval = -self.alpha_beta(board, depth - 1, ply + 1, -beta, -alpha);
            board.undo_move(mv, undo);

            if self.should_stop() {
                return 0;
            }
            if eval >= beta {
                self.store(key, beta, depth, Bound::Lower);
                return beta;
            }
            if eval > alpha {
                alpha = eval;
            }
        }

        self.store(key, alpha, depth, Bound::Upper);
        alpha
    }

    /// Capture-only extension at the horizon, starting from the stand-pat score.
    pub fn quiescence(&mut self, board: &mut Board, mut alpha: i32, beta: i32) -> i32 {
        if self.should_stop() {
            return 0;
        }
        self.nodes += 1;

        let stand_pat = self.evaluator.evaluate(board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut list = MoveList::new();
        self.movegen.generate_legal_captures(board, &mut list);
        self.order_moves(board, &mut list);

        for mv in &list {
            let undo = board.make_move(mv);
            let eval = -self.quiescence(board, -beta, -alpha);
            board.undo_move(mv, undo);

            if self.should_stop() {
                return 0;
            }
            if eval >= beta {
                return beta;
            }
            if eval > alpha {
                alpha = eval;
            }
        }

        alpha
    }

    /// Most promising moves first
    pub fn order_moves(&self, board: &Board, list: &mut MoveList) {
        list.sort_by_cost(|mv| -self.evaluator.score_move(board, mv));
    }

    fn store(&mut self, key: u64, value: i32, depth: i32, bound: Bound) {
        if self.config.use_transposition_table && !self.should_stop() {
            self.tt.set(key, value, depth, bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::PieceSquareEvaluator;
    use pretty_assertions::assert_eq;

    struct Fixture {
        tables: AttackTables,
        evaluator: PieceSquareEvaluator,
        tt: TranspositionTable,
        config: SearchConfig,
    }

    impl Fixture {
        fn new(config: SearchConfig) -> Self {
            Fixture {
                tables: AttackTables::new(),
                evaluator: PieceSquareEvaluator::new(),
                tt: TranspositionTable::new(16),
                config,
            }
        }

        fn searcher(&mut self) -> Searcher<'_, PieceSquareEvaluator> {
            Searcher::new(
                &self.tables,
                &self.evaluator,
                &mut self.tt,
                &self.config,
                CancellationToken::new(),
            )
        }
    }

    fn unpruned() -> SearchConfig {
        SearchConfig::default()
            .with_null_move_pruning(false)
            .with_transposition_table(false)
    }

    /// Plain negamax over every legal move, same leaves as the pruned search
    fn minimax(
        searcher: &mut Searcher<'_, PieceSquareEvaluator>,
        board: &mut Board,
        depth: i32,
        ply: i32,
    ) -> i32 {
        if depth <= 0 {
            return searcher.quiescence(board, -INF, INF);
        }
        let moves = searcher.movegen.legal_moves(board);
        if moves.is_empty() {
            return if searcher.movegen.in_check(board) { -MATE + ply } else { 0 };
        }
        let mut best = -INF;
        for mv in moves {
            let undo = board.make_move(mv);
            best = max(best, -minimax(searcher, board, depth - 1, ply + 1));
            board.undo_move(mv, undo);
        }
        best
    }

    #[test]
    fn test_stalemate_scores_zero() {
        let mut fixture = Fixture::new(SearchConfig::default());
        let mut board = Board::from_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1").unwrap();
        let score = fixture.searcher().alpha_beta(&mut board, 2, 1, -INF, INF);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_checkmate_scores_mate_minus_ply() {
        let mut fixture = Fixture::new(SearchConfig::default());
        let mut board = Board::from_fen("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1").unwrap();
        let before = board;
        let score = fixture.searcher().alpha_beta(&mut board, 2, 1, -INF, INF);
        assert_eq!(score, -MATE + 1);
        assert_eq!(board, before);

        let score = fixture.searcher().alpha_beta(&mut board, 3, 4, -INF, INF);
        assert_eq!(score, -MATE + 4);
    }

    #[test]
    fn test_illegal_position_is_sentinel() {
        let mut fixture = Fixture::new(SearchConfig::default());
        // White to move with black in check: black's last move was illegal
        let mut board = Board::from_fen("7k/6Q1/5K2/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(fixture.searcher().alpha_beta(&mut board, 2, 1, -INF, INF), INF);
    }

    #[test]
    fn test_alpha_beta_matches_minimax() {
        for (fen, depth) in [
            ("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", 3),
            ("4k3/8/3r4/8/3P4/2N5/8/4K2R w K - 0 1", 3),
            ("r3k2r/8/8/3q4/4P3/2N5/8/R3K3 b Qkq - 0 1", 2),
        ] {
            let mut fixture = Fixture::new(unpruned());
            let mut board = Board::from_fen(fen).unwrap();
            let before = board;

            let mut searcher = fixture.searcher();
            let expected = minimax(&mut searcher, &mut board, depth, 1);
            let pruned = searcher.alpha_beta(&mut board, depth, 1, -INF, INF);
            assert_eq!(pruned, expected, "{fen}");

            // Root pass over the same tree, one ply deeper
            let root = searcher.search_moves(&mut board, depth, -INF, INF);
            assert_eq!(root, minimax(&mut searcher, &mut board, depth, 0), "{fen}");
            assert_eq!(board, before);
        }
    }

    #[test]
    fn test_quiescence_resolves_hanging_capture() {
        let mut fixture = Fixture::new(SearchConfig::default());
        // White can win the undefended queen on d5
        let mut board = Board::from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let stand_pat = fixture.evaluator.evaluate(&board);
        let score = fixture.searcher().quiescence(&mut board, -INF, INF);
        assert!(score > stand_pat + 800);
    }

    #[test]
    fn test_quiescence_is_fail_hard() {
        let mut fixture = Fixture::new(SearchConfig::default());
        let mut board = Board::from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let score = fixture.searcher().quiescence(&mut board, -50, 50);
        assert_eq!(score, 50);
    }

    #[test]
    fn test_order_moves_puts_best_capture_first() {
        let mut fixture = Fixture::new(SearchConfig::default());
        let board = Board::from_fen("4k3/8/8/3q4/4P3/8/8/3QK3 w - - 0 1").unwrap();
        let searcher = fixture.searcher();
        let mut list = MoveList::new();
        let mut scratch = board;
        searcher.movegen.generate_legal_moves(&mut scratch, &mut list);
        searcher.order_moves(&board, &mut list);
        assert_eq!(list.get(0).to_uci(), "e4d5");
    }

    #[test]
    fn test_run_finds_mate_in_one() {
        let mut fixture = Fixture::new(
            SearchConfig::default()
                .with_time_limit(Duration::from_secs(30))
                .with_max_depth(2),
        );
        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let before = board;
        let report = fixture.searcher().run(&mut board);
        assert_eq!(report.best_move.map(|m| m.to_uci()), Some("a1a8".to_string()));
        assert_eq!(report.depth, 2);
        assert_eq!(report.score, MATE - 1);
        assert_eq!(board, before);
    }

    #[test]
    fn test_run_depth_one_completes_despite_cancellation() {
        let mut fixture = Fixture::new(SearchConfig::default());
        let token = CancellationToken::new();
        token.cancel();
        let mut board = Board::new();
        let mut searcher = Searcher::new(
            &fixture.tables,
            &fixture.evaluator,
            &mut fixture.tt,
            &fixture.config,
            token,
        );
        let report = searcher.run(&mut board);
        assert_eq!(report.depth, 1);
        assert!(report.best_move.is_some());
        assert_eq!(board, Board::new());
    }

    /// Evaluator that cancels the search after a fixed number of static evaluations,
    /// so the flag flips deep inside the tree at a reproducible point.
    struct CancelAfterEvals {
        inner: PieceSquareEvaluator,
        token: CancellationToken,
        remaining: std::cell::Cell<u64>,
    }

    impl Evaluator for CancelAfterEvals {
        fn evaluate(&self, board: &Board) -> i32 {
            let left = self.remaining.get();
            if left == 0 {
                self.token.cancel();
            } else {
                self.remaining.set(left - 1);
            }
            self.inner.evaluate(board)
        }

        fn score_move(&self, board: &Board, mv: Move) -> i32 {
            self.inner.score_move(board, mv)
        }
    }

    #[test]
    fn test_cancellation_mid_tree_restores_board() {
        let tables = AttackTables::new();
        let config = SearchConfig::default();
        let fens = [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbqkbnr/pp1ppppp/8/2pP4/8/8/PPP1PPPP/RNBQKBNR w KQkq c6 0 3",
        ];

        for fen in fens {
            for evals in [10, 200, 1_000, 5_000, 20_000] {
                let token = CancellationToken::new();
                let evaluator = CancelAfterEvals {
                    inner: PieceSquareEvaluator::new(),
                    token: token.clone(),
                    remaining: std::cell::Cell::new(evals),
                };
                let mut tt = TranspositionTable::new(16);
                let mut board = Board::from_fen(fen).unwrap();
                let before = board;

                let mut searcher = Searcher::new(&tables, &evaluator, &mut tt, &config, token);
                let report = searcher.run(&mut board);

                assert_eq!(board, before, "{} cancelled after {} evals", fen, evals);
                assert_eq!(board.hash(), board.compute_hash());
                assert!(report.depth >= 1);
                assert_eq!(report.nodes, searcher.nodes());
                let legal = MoveGenerator::new(&tables).legal_moves(&board);
                assert!(legal.contains(&report.best_move.unwrap()));
            }
        }
    }

    #[test]
    fn test_tt_bits_capped() {
        assert_eq!(SearchConfig::default().with_tt_bits(64).tt_bits, MAX_TT_BITS);
        assert_eq!(SearchConfig::default().with_tt_bits(12).tt_bits, 12);
    }

    #[test]
    fn test_cancellation_token_timer_fires() {
        let token = CancellationToken::new();
        token.cancel_after(Duration::from_millis(10));
        let start = Instant::now();
        while !token.is_cancelled() {
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::sleep(Duration::from_millis(1));
        }
    }
}
