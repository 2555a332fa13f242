//! T-Cubed 共享协议库
//!
//! 包含:
//! - 棋子、位置、棋盘等核心数据结构
//! - 位棋盘编解码 (十六进制线上格式)
//! - 与游戏服务交互的消息类型 (Game, MoveRequest, MoveOutcome)
//! - 走棋记录与神经网络轨迹

mod bitboard;
mod board;
mod constants;
mod error;
mod message;
mod piece;
mod record;

pub use bitboard::BitBoard;
pub use board::Board;
pub use constants::*;
pub use error::{CodecError, Result};
pub use message::{
    Game, GameType, MinimaxMoveResponse, MoveOutcome, MoveRequest, NeuralMoveResponse,
    NewGameRequest, NewGameResponse, TerminalState,
};
pub use piece::{validate_pieces, Piece, Position};
pub use record::{MoveEvent, MoveRecord, Trace};
