use thiserror::Error;

/// Errors raised while reading positions and moves from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChessError {
    #[error("FEN must have 4 or 6 space-separated fields, found {0}")]
    FenFieldCount(usize),

    #[error("invalid piece placement in FEN: {0}")]
    FenPlacement(String),

    #[error("invalid side to move in FEN: {0}")]
    FenSideToMove(String),

    #[error("invalid castling rights in FEN: {0}")]
    FenCastling(String),

    #[error("invalid en passant square in FEN: {0}")]
    FenEnPassant(String),

    #[error("invalid move counter in FEN: {0}")]
    FenCounter(String),

    #[error("{0} must have exactly one king")]
    KingCount(&'static str),

    #[error("cannot parse move `{0}`")]
    MoveSyntax(String),

    #[error("move `{0}` is not legal in this position")]
    IllegalMove(String),
}

pub type Result<T> = std::result::Result<T, ChessError>;
