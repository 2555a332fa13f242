//! 棋盘状态

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bitboard::BitBoard;
use crate::constants::BOARD_CELLS;
use crate::error::{CodecError, Result};
use crate::piece::{Piece, Position};

/// 所有连成一线的组合（行、列、对角线）
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 棋盘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    /// 3x3 棋盘，行优先索引，`None` 表示空格
    squares: [Option<Piece>; BOARD_CELLS],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从十六进制编码解码
    pub fn decode(hex: &str, player_1_piece: Piece, player_2_piece: Piece) -> Result<Self> {
        let bits = BitBoard::from_hex(hex)?;
        Self::from_bitboard(&bits, player_1_piece, player_2_piece)
    }

    /// 从位棋盘展开
    pub fn from_bitboard(bits: &BitBoard, player_1_piece: Piece, player_2_piece: Piece) -> Result<Self> {
        if player_1_piece == player_2_piece {
            return Err(CodecError::InvalidPieceAssignment);
        }

        let mut board = Self::empty();
        for pos in Position::all() {
            match (bits.player_1_at(pos), bits.player_2_at(pos)) {
                (true, true) => {
                    return Err(CodecError::ConflictingClaim {
                        position: pos.index(),
                    })
                }
                (true, false) => board.set(pos, Some(player_1_piece)),
                (false, true) => board.set(pos, Some(player_2_piece)),
                (false, false) => {}
            }
        }
        Ok(board)
    }

    /// 压缩为位棋盘
    pub fn to_bitboard(&self, player_1_piece: Piece, player_2_piece: Piece) -> Result<BitBoard> {
        if player_1_piece == player_2_piece {
            return Err(CodecError::InvalidPieceAssignment);
        }

        let mut player_1 = 0u16;
        let mut player_2 = 0u16;
        for pos in Position::all() {
            match self.get(pos) {
                Some(piece) if piece == player_1_piece => player_1 |= 1 << pos.index(),
                Some(piece) if piece == player_2_piece => player_2 |= 1 << pos.index(),
                Some(_) => {
                    return Err(CodecError::UnassignedPiece {
                        position: pos.index(),
                    })
                }
                None => {}
            }
        }
        BitBoard::new(player_1, player_2)
    }

    /// 编码为十六进制字符串
    pub fn encode(&self, player_1_piece: Piece, player_2_piece: Piece) -> Result<String> {
        Ok(self.to_bitboard(player_1_piece, player_2_piece)?.to_hex())
    }

    /// 获取指定位置的棋子
    pub fn get(&self, pos: Position) -> Option<Piece> {
        self.squares[pos.index()]
    }

    /// 设置指定位置的棋子
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        self.squares[pos.index()] = piece;
    }

    /// 该位置是否为空
    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    /// 所有格子
    pub fn squares(&self) -> &[Option<Piece>; BOARD_CELLS] {
        &self.squares
    }

    /// 棋盘是否已满
    pub fn is_full(&self) -> bool {
        self.squares.iter().all(Option::is_some)
    }

    /// 返回已连成一线的三个位置（如有）
    pub fn winning_line(&self) -> Option<[Position; 3]> {
        LINES.iter().find_map(|&[a, b, c]| {
            let first = self.squares[a]?;
            if self.squares[b] == Some(first) && self.squares[c] == Some(first) {
                Some([Position::new(a)?, Position::new(b)?, Position::new(c)?])
            } else {
                None
            }
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, square) in self.squares.iter().enumerate() {
            match square {
                Some(piece) => write!(f, "{}", piece)?,
                None => write!(f, "_")?,
            }
            if i % 3 == 2 && i + 1 < BOARD_CELLS {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
