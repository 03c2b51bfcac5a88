//! Engine front end
//!
//! `Engine` owns every long-lived component a move decision needs: attack tables,
//! evaluator, opening book and transposition table. Each `search` call borrows them into
//! a fresh `Searcher` and runs it against a private copy of the caller's board.

use std::time::Instant;

use log::info;

use crate::bitboard::AttackTables;
use crate::board::Board;
use crate::book::OpeningBook;
use crate::error::Result;
use crate::evaluate::{Evaluator, PieceSquareEvaluator};
use crate::movegen::MoveGenerator;
use crate::search::{CancellationToken, SearchConfig, SearchReport, Searcher};
use crate::tt::TranspositionTable;
use crate::types::Move;

pub struct Engine<E: Evaluator = PieceSquareEvaluator> {
    tables: AttackTables,
    evaluator: E,
    book: Option<OpeningBook>,
    tt: TranspositionTable,
    config: SearchConfig,
    last_report: Option<SearchReport>,
}

impl Engine<PieceSquareEvaluator> {
    pub fn new(config: SearchConfig) -> Result<Self> {
        Self::with_evaluator(config, PieceSquareEvaluator::new())
    }
}

impl<E: Evaluator> Engine<E> {
    /// Build an engine around a custom evaluator. Fails only if the bundled book is broken.
    pub fn with_evaluator(config: SearchConfig, evaluator: E) -> Result<Self> {
        let tables = AttackTables::new();
        let book = if config.use_book {
            Some(OpeningBook::new(&tables)?)
        } else {
            None
        };

        Ok(Engine {
            tt: TranspositionTable::new(config.tt_bits),
            tables,
            evaluator,
            book,
            config,
            last_report: None,
        })
    }

    pub fn tables(&self) -> &AttackTables {
        &self.tables
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn generate_legal_moves(&self, board: &Board) -> Vec<Move> {
        MoveGenerator::new(&self.tables).legal_moves(board)
    }

    /// Choose a move for the side to move, or `None` when it has no legal move.
    /// The caller's board is never modified.
    pub fn select_move(&mut self, board: &Board) -> Option<Move> {
        self.search(board).best_move
    }

    /// Book lookup first, then a time-limited search.
    pub fn search(&mut self, board: &Board) -> SearchReport {
        let start = Instant::now();

        if let Some(book) = &self.book {
            if let Some(mv) = book.select(&self.tables, board) {
                info!("book move {}", mv);
                let report = SearchReport::book_move(mv, start.elapsed());
                self.last_report = Some(report);
                return report;
            }
        }

        if self.generate_legal_moves(board).is_empty() {
            let report = SearchReport {
                best_move: None,
                score: 0,
                depth: 0,
                nodes: 0,
                elapsed: start.elapsed(),
                from_book: false,
            };
            self.last_report = Some(report);
            return report;
        }

        self.tt.clear();
        let token = CancellationToken::new();
        token.cancel_after(self.config.time_limit);

        let mut scratch = *board;
        let mut searcher = Searcher::new(
            &self.tables,
            &self.evaluator,
            &mut self.tt,
            &self.config,
            token,
        );
        let report = searcher.run(&mut scratch);

        info!(
            "searched depth {} score {} nodes {} in {:.3}s",
            report.depth,
            report.score,
            report.nodes,
            report.elapsed.as_secs_f32()
        );
        info!("{}", self.tt.info());

        self.last_report = Some(report);
        report
    }

    pub fn last_report(&self) -> Option<&SearchReport> {
        self.last_report.as_ref()
    }

    pub fn tt_info(&self) -> String {
        self.tt.info()
    }
}
