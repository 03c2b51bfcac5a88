pub mod bitboard;
pub mod board;
pub mod book;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod game;
pub mod movegen;
pub mod movelist;
pub mod perft;
pub mod search;
pub mod tt;
pub mod types;
pub mod zobrist;

pub use board::Board;
pub use engine::Engine;
pub use error::{ChessError, Result};
pub use search::{SearchConfig, SearchReport};
pub use types::{Color, Move, PieceType};
