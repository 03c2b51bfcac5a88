use chrono::prelude::*;
use log::info;

use crate::board::{Board, STARTING_POSITION_FEN};
use crate::engine::Engine;
use crate::error::Result;
use crate::evaluate::Evaluator;
use crate::movegen::MoveGenerator;
use crate::types::{Color, Move};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Checkmate(Color),
    Stalemate,
    /// Move limit reached with the game still running
    Unfinished,
}

impl GameResult {
    /// PGN result tag
    pub fn to_pgn(self) -> &'static str {
        match self {
            GameResult::Checkmate(Color::White) => "1-0",
            GameResult::Checkmate(Color::Black) => "0-1",
            GameResult::Stalemate => "1/2-1/2",
            GameResult::Unfinished => "*",
        }
    }
}

/// Engine self-play record.
pub struct Game {
    board: Board,
    moves: Vec<Move>,
    start_fen: String,
    game_start_time: DateTime<Local>,
    result: GameResult,
    silent: bool,
}

impl Game {
    pub fn new() -> Self {
        Game {
            board: Board::new(),
            moves: Vec::new(),
            start_fen: STARTING_POSITION_FEN.to_string(),
            game_start_time: Local::now(),
            result: GameResult::Unfinished,
            silent: false,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        Ok(Game {
            board: Board::from_fen(fen)?,
            start_fen: fen.to_string(),
            ..Game::new()
        })
    }

    /// Suppress the per-move board printout
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Let the engine play both sides for up to `max_moves` full moves.
    pub fn play<E: Evaluator>(&mut self, engine: &mut Engine<E>, max_moves: u32) -> GameResult {
        let max_plies = 2 * max_moves as usize;

        while self.moves.len() < max_plies {
            let Some(mv) = engine.select_move(&self.board) else {
                break;
            };
            let color = self.board.get_active_color();
            self.board.make_move(mv);
            self.moves.push(mv);

            if !self.silent {
                let from_book = engine.last_report().is_some_and(|r| r.from_book);
                println!(
                    "move {}: {} plays {}{}",
                    self.moves.len().div_ceil(2),
                    color.to_human(),
                    mv,
                    if from_book { " (book)" } else { "" }
                );
                println!("{}", self.board.draw_board());
            }
        }

        self.result = self.adjudicate(engine);
        info!("game over after {} plies: {}", self.moves.len(), self.result.to_pgn());
        self.result
    }

    fn adjudicate<E: Evaluator>(&self, engine: &Engine<E>) -> GameResult {
        let movegen = MoveGenerator::new(engine.tables());
        if !movegen.legal_moves(&self.board).is_empty() {
            return GameResult::Unfinished;
        }
        if movegen.in_check(&self.board) {
            GameResult::Checkmate(self.board.get_active_color().other())
        } else {
            GameResult::Stalemate
        }
    }

    pub fn to_pgn(&self) -> String {
        let mut pgn = String::new();
        pgn.push_str("[Event \"Engine self-play\"]\n");
        pgn.push_str("[Site \"?\"]\n");
        pgn.push_str(&format!("[Date \"{}\"]\n", self.game_start_time.format("%Y.%m.%d")));
        pgn.push_str("[Round \"1\"]\n");
        pgn.push_str("[White \"pumpking\"]\n");
        pgn.push_str("[Black \"pumpking\"]\n");
        pgn.push_str(&format!("[Result \"{}\"]\n", self.result.to_pgn()));
        if self.start_fen != STARTING_POSITION_FEN {
            pgn.push_str("[SetUp \"1\"]\n");
            pgn.push_str(&format!("[FEN \"{}\"]\n", self.start_fen));
        }
        pgn.push('\n');

        // Move numbers continue from the start position; black to move opens with "N..."
        let Ok(start) = Board::from_fen(&self.start_fen) else {
            return pgn;
        };
        let mut number = start.fullmove_number();
        let mut white_to_move = start.get_active_color() == Color::White;
        for (i, mv) in self.moves.iter().enumerate() {
            if white_to_move {
                pgn.push_str(&format!("{}. ", number));
            } else if i == 0 {
                pgn.push_str(&format!("{}... ", number));
            }
            pgn.push_str(&mv.to_uci());
            pgn.push(' ');
            if !white_to_move {
                number += 1;
            }
            white_to_move = !white_to_move;
        }
        pgn.push_str(self.result.to_pgn());
        pgn
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
