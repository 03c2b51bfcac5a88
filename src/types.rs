use std::fmt;

use crate::bitboard::{parse_square, square_name};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn from_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub const fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn to_human(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse a piece letter, either case
    pub fn from_char(c: char) -> Option<PieceType> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }

    /// Uppercase piece letter
    pub fn to_char(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }
}

/// Promotion order used by the move generator
pub const PROMOTION_PIECES: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Rook,
];

/// Bit-set describing what kind of move a `Move` is.
///
/// The two high bits name the promoted piece, indexed into `PROMOTION_PIECES`, and only
/// mean something when `PROMOTION` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MoveFlags(u8);

impl MoveFlags {
    pub const QUIET: MoveFlags = MoveFlags(0);
    pub const CAPTURE: MoveFlags = MoveFlags(1);
    pub const DOUBLE_PUSH: MoveFlags = MoveFlags(1 << 1);
    pub const EN_PASSANT: MoveFlags = MoveFlags(1 << 2);
    pub const CASTLE_KINGSIDE: MoveFlags = MoveFlags(1 << 3);
    pub const CASTLE_QUEENSIDE: MoveFlags = MoveFlags(1 << 4);
    pub const PROMOTION: MoveFlags = MoveFlags(1 << 5);

    const PROMOTION_SHIFT: u8 = 6;

    /// Promotion flag with the promoted piece encoded
    pub fn promotion(piece: PieceType) -> MoveFlags {
        let code = PROMOTION_PIECES
            .iter()
            .position(|&p| p == piece)
            .unwrap_or(0) as u8;
        MoveFlags(Self::PROMOTION.0 | (code << Self::PROMOTION_SHIFT))
    }

    #[inline(always)]
    pub const fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn promotion_piece(self) -> Option<PieceType> {
        if self.contains(Self::PROMOTION) {
            Some(PROMOTION_PIECES[(self.0 >> Self::PROMOTION_SHIFT) as usize])
        } else {
            None
        }
    }
}

impl std::ops::BitOr for MoveFlags {
    type Output = MoveFlags;

    fn bitor(self, rhs: MoveFlags) -> MoveFlags {
        MoveFlags(self.0 | rhs.0)
    }
}

/// A move as produced by the generator. Plain value, freely copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub flags: MoveFlags,
}

impl Move {
    #[inline(always)]
    pub const fn new(from: u8, to: u8, flags: MoveFlags) -> Self {
        Move { from, to, flags }
    }

    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.flags.contains(MoveFlags::CAPTURE)
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        self.flags.contains(MoveFlags::EN_PASSANT)
    }

    #[inline(always)]
    pub const fn is_double_push(&self) -> bool {
        self.flags.contains(MoveFlags::DOUBLE_PUSH)
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.flags.contains(MoveFlags::CASTLE_KINGSIDE)
            || self.flags.contains(MoveFlags::CASTLE_QUEENSIDE)
    }

    #[inline(always)]
    pub fn promotion(&self) -> Option<PieceType> {
        self.flags.promotion_piece()
    }

    /// Coordinate notation, e.g. `e2e4` or `e7e8q`
    pub fn to_uci(&self) -> String {
        let mut s = format!("{}{}", square_name(self.from), square_name(self.to));
        if let Some(piece) = self.promotion() {
            s.push(piece.to_char().to_ascii_lowercase());
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// A coordinate move before it is matched against a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciMove {
    pub from: u8,
    pub to: u8,
    pub promotion: Option<PieceType>,
}

impl UciMove {
    pub fn parse(text: &str) -> Option<UciMove> {
        if !(4..=5).contains(&text.len()) || !text.is_ascii() {
            return None;
        }
        let from = parse_square(&text[0..2])?;
        let to = parse_square(&text[2..4])?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => match PieceType::from_char(c)? {
                PieceType::Pawn | PieceType::King => return None,
                piece => Some(piece),
            },
        };
        Some(UciMove { from, to, promotion })
    }

    pub fn matches(&self, mv: &Move) -> bool {
        self.from == mv.from && self.to == mv.to && self.promotion == mv.promotion()
    }
}
