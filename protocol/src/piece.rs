//! 棋子与位置定义

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_CELLS;

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    X,
    O,
}

impl Piece {
    /// 获取对方棋子
    pub fn opponent(&self) -> Piece {
        match self {
            Piece::X => Piece::O,
            Piece::O => Piece::X,
        }
    }

    /// 显示字符
    pub fn display_char(&self) -> char {
        match self {
            Piece::X => 'X',
            Piece::O => 'O',
        }
    }

    /// 从字符解析（不区分大小写）
    pub fn from_char(c: char) -> Option<Piece> {
        match c.to_ascii_uppercase() {
            'X' => Some(Piece::X),
            'O' => Some(Piece::O),
            _ => None,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_char())
    }
}

/// 校验棋子分配：人类与 AI 必须一方 X 一方 O
pub fn validate_pieces(human: Piece, ai: Piece) -> bool {
    human == ai.opponent()
}

/// 棋盘位置
///
/// 内部使用 0..=8 的行优先索引；线上协议（走棋请求、着法排名）使用 1..=9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(u8);

impl Position {
    /// 从 0 起始的索引创建
    pub fn new(index: usize) -> Option<Self> {
        if index < BOARD_CELLS {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// 从 1 起始的编号创建（线上格式）
    pub fn from_number(number: u8) -> Option<Self> {
        if (1..=BOARD_CELLS as u8).contains(&number) {
            Some(Self(number - 1))
        } else {
            None
        }
    }

    /// 0 起始索引
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// 1 起始编号
    pub fn number(&self) -> u8 {
        self.0 + 1
    }

    /// 行 (0..3)
    pub fn row(&self) -> usize {
        self.index() / 3
    }

    /// 列 (0..3)
    pub fn col(&self) -> usize {
        self.index() % 3
    }

    /// 遍历所有位置
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_CELLS as u8).map(Position)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

// 线上格式为 1..=9
impl Serialize for Position {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let number = u8::deserialize(deserializer)?;
        Position::from_number(number).ok_or_else(|| {
            serde::de::Error::custom(format!("position out of range: {}", number))
        })
    }
}
