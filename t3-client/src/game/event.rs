//! 队列事件与状态机动作

use protocol::{Game, MoveRecord, Position, Trace};

/// 进入事件队列的事件
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// 从服务器加载对局
    LoadGame,
    /// 人类落子
    HumanMove { position: Position },
    /// AI 动画的第 `step` 步，携带走棋后的新局面
    AnimationStep {
        step: u8,
        game: Game,
        ranked_moves: Option<Vec<Position>>,
    },
    /// 复盘时选中某一步
    SetMoveHistory(MoveRecord),
    /// 外部报告的错误
    Error { cause: String },
}

/// 处理器分发给状态机的动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Loaded(Game),
    HumanMoved {
        game: Game,
        trace: Option<Trace>,
        ranked_moves: Option<Vec<Position>>,
    },
    AnimationStepped {
        step: u8,
        game: Game,
        ranked_moves: Option<Vec<Position>>,
    },
    MoveHistorySelected(MoveRecord),
    Failed { cause: String },
}

impl Action {
    /// 动作名称（日志用）
    pub fn name(&self) -> &'static str {
        match self {
            Action::Loaded(_) => "Loaded",
            Action::HumanMoved { .. } => "HumanMoved",
            Action::AnimationStepped { .. } => "AnimationStepped",
            Action::MoveHistorySelected(_) => "MoveHistorySelected",
            Action::Failed { .. } => "Failed",
        }
    }
}
