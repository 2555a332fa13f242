//! 错误类型定义

use thiserror::Error;

/// 棋盘编解码错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// 编码格式无效（长度不为 8 或含非十六进制字符）
    #[error("Invalid board encoding: {reason}")]
    InvalidEncoding { reason: String },

    /// 同一格子被双方同时占据
    #[error("Conflicting claim at position {position}")]
    ConflictingClaim { position: usize },

    /// 格子上的棋子不属于任何一方
    #[error("Piece at position {position} is not assigned to either player")]
    UnassignedPiece { position: usize },

    /// 双方被分配了相同的棋子
    #[error("Both players were assigned the same piece")]
    InvalidPieceAssignment,
}

impl CodecError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CodecError::InvalidEncoding {
            reason: reason.into(),
        }
    }
}

/// 编解码结果类型
pub type Result<T> = std::result::Result<T, CodecError>;
