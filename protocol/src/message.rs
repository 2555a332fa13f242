//! 消息类型定义
//!
//! 与游戏服务交互的 JSON 报文

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::constants::{AI_PLAYER_ID, HUMAN_PLAYER_ID};
use crate::error::Result;
use crate::piece::{Piece, Position};
use crate::record::Trace;

/// 对局类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Minimax 搜索
    Minimax,
    /// 前馈神经网络
    NeuralNetwork,
}

impl GameType {
    /// 最后一个动画步编号
    ///
    /// 神经网络模式逐层揭示输入层之后的 4 层
    pub fn last_animation_step(&self) -> u8 {
        match self {
            GameType::Minimax => 1,
            GameType::NeuralNetwork => 4,
        }
    }

    /// 走棋接口后缀
    pub fn move_endpoint(&self) -> &'static str {
        match self {
            GameType::Minimax => "mm",
            GameType::NeuralNetwork => "nn",
        }
    }

    /// 是否带有网络轨迹
    pub fn has_trace(&self) -> bool {
        matches!(self, GameType::NeuralNetwork)
    }
}

/// 终局状态（线上为整数 0..=3）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TerminalState {
    /// 进行中
    #[default]
    Ongoing,
    /// 人类胜
    HumanWin,
    /// AI 胜
    AiWin,
    /// 和棋
    Draw,
}

impl TerminalState {
    /// 对局是否已结束
    pub fn is_over(&self) -> bool {
        !matches!(self, TerminalState::Ongoing)
    }
}

impl TryFrom<u8> for TerminalState {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(TerminalState::Ongoing),
            1 => Ok(TerminalState::HumanWin),
            2 => Ok(TerminalState::AiWin),
            3 => Ok(TerminalState::Draw),
            other => Err(format!("unknown terminal state: {}", other)),
        }
    }
}

impl From<TerminalState> for u8 {
    fn from(state: TerminalState) -> u8 {
        match state {
            TerminalState::Ongoing => 0,
            TerminalState::HumanWin => 1,
            TerminalState::AiWin => 2,
            TerminalState::Draw => 3,
        }
    }
}

/// 服务器端对局
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    pub game_type: GameType,
    /// 十六进制位棋盘
    pub board_state: String,
    pub next_player_id: u8,
    pub player_1_piece: Piece,
    pub player_2_piece: Piece,
    #[serde(default)]
    pub terminal_state: TerminalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_player_id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Game {
    /// 解码当前棋盘
    pub fn board(&self) -> Result<Board> {
        Board::decode(&self.board_state, self.player_1_piece, self.player_2_piece)
    }

    /// 人类执子
    pub fn human_piece(&self) -> Piece {
        self.player_1_piece
    }

    /// 是否轮到人类
    pub fn is_human_turn(&self) -> bool {
        self.next_player_id == HUMAN_PLAYER_ID
    }
}

/// 走棋请求（服务端要求字符串字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub player_id: String,
    pub position: String,
}

impl MoveRequest {
    /// 人类在指定位置落子
    pub fn human(position: Position) -> Self {
        Self {
            player_id: HUMAN_PLAYER_ID.to_string(),
            position: position.number().to_string(),
        }
    }
}

/// Minimax 走棋响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimaxMoveResponse {
    pub game: Game,
}

/// 神经网络走棋响应
///
/// 人类一步终局时 AI 不会落子，`trace` 与 `ranked_moves` 均为空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralMoveResponse {
    pub game: Game,
    #[serde(default)]
    pub trace: Option<Trace>,
    #[serde(default)]
    pub ranked_moves: Option<Vec<Position>>,
}

/// 走棋结果（两种模式统一）
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub game: Game,
    pub trace: Option<Trace>,
    pub ranked_moves: Option<Vec<Position>>,
}

impl From<MinimaxMoveResponse> for MoveOutcome {
    fn from(resp: MinimaxMoveResponse) -> Self {
        Self {
            game: resp.game,
            trace: None,
            ranked_moves: None,
        }
    }
}

impl From<NeuralMoveResponse> for MoveOutcome {
    fn from(resp: NeuralMoveResponse) -> Self {
        Self {
            game: resp.game,
            trace: resp.trace,
            ranked_moves: resp.ranked_moves,
        }
    }
}

/// 创建对局请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameRequest {
    pub name: String,
    pub game_type: GameType,
    pub player_1_piece: Piece,
    pub player_2_piece: Piece,
    pub next_player_id: u8,
    pub ai_player_id: u8,
}

impl NewGameRequest {
    /// 人类先手
    pub fn new(name: impl Into<String>, game_type: GameType, human_piece: Piece) -> Self {
        Self {
            name: name.into(),
            game_type,
            player_1_piece: human_piece,
            player_2_piece: human_piece.opponent(),
            next_player_id: HUMAN_PLAYER_ID,
            ai_player_id: AI_PLAYER_ID,
        }
    }
}

/// 创建对局响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameResponse {
    pub uuid: String,
    pub game_type: GameType,
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME_JSON: &str = r#"{
        "uuid": "7d3c",
        "name": "test",
        "game_type": "neural_network",
        "board_state": "00100001",
        "next_player_id": 1,
        "player_1_piece": "X",
        "player_2_piece": "O",
        "terminal_state": 0,
        "created_at": "2024-05-01T12:00:00Z"
    }"#;

    #[test]
    fn test_game_deserialize() {
        let game: Game = serde_json::from_str(GAME_JSON).unwrap();
        assert_eq!(game.game_type, GameType::NeuralNetwork);
        assert_eq!(game.terminal_state, TerminalState::Ongoing);
        assert!(game.is_human_turn());
        assert!(game.created_at.is_some());
        assert!(game.updated_at.is_none());

        let board = game.board().unwrap();
        assert_eq!(board.get(Position::new(4).unwrap()), Some(Piece::X));
        assert_eq!(board.get(Position::new(0).unwrap()), Some(Piece::O));
    }

    #[test]
    fn test_terminal_state_codes() {
        let states: Vec<TerminalState> = serde_json::from_str("[0, 1, 2, 3]").unwrap();
        assert_eq!(
            states,
            vec![
                TerminalState::Ongoing,
                TerminalState::HumanWin,
                TerminalState::AiWin,
                TerminalState::Draw
            ]
        );
        assert_eq!(serde_json::to_string(&TerminalState::AiWin).unwrap(), "2");
        assert!(serde_json::from_str::<TerminalState>("7").is_err());
    }

    #[test]
    fn test_move_request_uses_strings() {
        let req = MoveRequest::human(Position::new(4).unwrap());
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"player_id": "1", "position": "5"}));
    }

    #[test]
    fn test_neural_response_without_ai_reply() {
        let json = format!(
            r#"{{"game": {}, "trace": null, "ranked_moves": null}}"#,
            GAME_JSON
        );
        let resp: NeuralMoveResponse = serde_json::from_str(&json).unwrap();
        let outcome = MoveOutcome::from(resp);
        assert!(outcome.trace.is_none());
        assert!(outcome.ranked_moves.is_none());
    }

    #[test]
    fn test_neural_response_ranked_moves() {
        let json = format!(
            r#"{{"game": {}, "trace": {{"layerOutputs": [[1.0], [0.5]]}}, "ranked_moves": [5, 1, 9]}}"#,
            GAME_JSON
        );
        let outcome = MoveOutcome::from(serde_json::from_str::<NeuralMoveResponse>(&json).unwrap());
        let ranked = outcome.ranked_moves.unwrap();
        assert_eq!(ranked[0].index(), 4);
        assert_eq!(ranked[2].index(), 8);
        assert_eq!(outcome.trace.unwrap().layer_outputs.len(), 2);
    }

    #[test]
    fn test_game_type_glue() {
        assert_eq!(GameType::Minimax.last_animation_step(), 1);
        assert_eq!(GameType::NeuralNetwork.last_animation_step(), 4);
        assert_eq!(GameType::Minimax.move_endpoint(), "mm");
        assert_eq!(
            serde_json::to_string(&GameType::NeuralNetwork).unwrap(),
            "\"neural_network\""
        );
    }

    #[test]
    fn test_new_game_request() {
        let req = NewGameRequest::new("casual", GameType::Minimax, Piece::O);
        assert_eq!(req.player_2_piece, Piece::X);
        assert_eq!(req.next_player_id, 1);
        assert_eq!(req.ai_player_id, 2);
    }
}
