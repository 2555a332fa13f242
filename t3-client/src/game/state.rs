//! 回合状态机
//!
//! `reduce` 是纯函数：只根据当前状态和动作计算新状态，
//! 后续事件（下一步动画）由处理器根据新状态决定是否入队

use protocol::{BitBoard, Board, CodecError, Game, GameType, MoveRecord, Position, TerminalState, Trace};
use tracing::{debug, warn};

use super::event::Action;
use super::neural::Network;

/// 回合阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// 正在加载对局
    #[default]
    Loading,
    /// 等待人类落子
    PlayerTurn,
    /// 已收到走棋结果，等待动画开始
    AiTurn,
    /// 正在播放 AI 动画
    Animating,
    /// 对局结束（可复盘）
    GameOver,
    /// 出错
    Error,
}

impl Phase {
    /// 本局不会再离开的阶段
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::GameOver | Phase::Error)
    }
}

/// 客户端回合状态
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnState {
    pub phase: Phase,
    /// 缓存的对局（动画期间棋盘可能是拼接后的）
    pub game: Option<Game>,
    /// 当前显示的棋盘
    pub board: Option<Board>,
    pub trace: Option<Trace>,
    pub ranked_moves: Option<Vec<Position>>,
    pub network: Network,
    /// 最近一次失败的原因
    pub error: Option<String>,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game_type(&self) -> Option<GameType> {
        self.game.as_ref().map(|g| g.game_type)
    }

    pub fn terminal_state(&self) -> Option<TerminalState> {
        self.game.as_ref().map(|g| g.terminal_state)
    }

    /// 该位置当前能否落子
    pub fn can_play(&self, position: Position) -> bool {
        self.phase == Phase::PlayerTurn
            && self.board.map(|b| b.is_empty_at(position)).unwrap_or(false)
    }

    fn failed(cause: impl Into<String>) -> Self {
        Self {
            phase: Phase::Error,
            error: Some(cause.into()),
            ..Self::default()
        }
    }
}

/// 状态转移
pub fn reduce(state: TurnState, action: Action) -> TurnState {
    let phase = state.phase;
    let name = action.name();

    let result = match (phase, action) {
        (_, Action::Failed { cause }) => Ok(TurnState::failed(cause)),
        (Phase::Loading, Action::Loaded(game)) => loaded(game),
        (Phase::PlayerTurn, Action::HumanMoved { game, trace, ranked_moves }) => {
            human_moved(state, game, trace, ranked_moves)
        }
        (Phase::AiTurn | Phase::Animating, Action::AnimationStepped { step, game, ranked_moves }) => {
            animation_stepped(state, step, game, ranked_moves)
        }
        (Phase::GameOver, Action::MoveHistorySelected(record)) => history_selected(state, record),
        (_, _) => {
            warn!("Ignoring action {} in phase {:?}", name, phase);
            return state;
        }
    };

    let next = result.unwrap_or_else(|e| {
        warn!("{} rejected, malformed board: {}", name, e);
        TurnState::failed(e.to_string())
    });
    debug!("{}: {:?} -> {:?}", name, phase, next.phase);
    next
}

fn decode(game: &Game) -> Result<(BitBoard, Board), CodecError> {
    let bits = BitBoard::from_hex(&game.board_state)?;
    let board = Board::from_bitboard(&bits, game.player_1_piece, game.player_2_piece)?;
    Ok((bits, board))
}

/// 终局进入 GameOver，否则轮到人类
fn phase_after(game: &Game) -> Phase {
    if game.terminal_state.is_over() {
        Phase::GameOver
    } else {
        Phase::PlayerTurn
    }
}

fn loaded(game: Game) -> Result<TurnState, CodecError> {
    let (bits, board) = decode(&game)?;
    Ok(TurnState {
        phase: phase_after(&game),
        game: Some(game),
        board: Some(board),
        trace: None,
        ranked_moves: None,
        network: Network::from_board(&bits),
        error: None,
    })
}

fn human_moved(
    state: TurnState,
    game: Game,
    trace: Option<Trace>,
    ranked_moves: Option<Vec<Position>>,
) -> Result<TurnState, CodecError> {
    // AI 没有回应（人类一步终局），直接结束
    if game.game_type.has_trace() && trace.is_none() && ranked_moves.is_none() {
        let (_, board) = decode(&game)?;
        return Ok(TurnState {
            phase: Phase::GameOver,
            game: Some(game),
            board: Some(board),
            trace: None,
            ranked_moves: None,
            ..state
        });
    }

    // 新局面先不展示，等待动画
    Ok(TurnState {
        phase: Phase::AiTurn,
        trace,
        ..state
    })
}

/// 隐藏 AI 新落的子：人类部分取新局面，AI 部分取缓存的旧局面
fn hide_ai_move(state: &mut TurnState, game: &Game) -> Result<(), CodecError> {
    let next_bits = BitBoard::from_hex(&game.board_state)?;
    let prev_bits = match state.game.as_ref() {
        Some(cached) => BitBoard::from_hex(&cached.board_state)?,
        None => BitBoard::empty(),
    };
    let spliced = BitBoard::splice(&next_bits, &prev_bits)?;
    let board = Board::from_bitboard(&spliced, game.player_1_piece, game.player_2_piece)?;

    if let Some(cached) = state.game.as_mut() {
        cached.board_state = spliced.to_hex();
    }
    state.board = Some(board);
    state.network = Network::from_board(&spliced);
    Ok(())
}

fn animation_stepped(
    mut state: TurnState,
    step: u8,
    game: Game,
    ranked_moves: Option<Vec<Position>>,
) -> Result<TurnState, CodecError> {
    if step == 0 {
        hide_ai_move(&mut state, &game)?;
    }

    // 人类这一步已经获胜
    if game.terminal_state == TerminalState::HumanWin {
        let (_, board) = decode(&game)?;
        return Ok(TurnState {
            phase: Phase::GameOver,
            game: Some(game),
            board: Some(board),
            ranked_moves,
            ..state
        });
    }

    if step > 0 {
        if let Some(trace) = state.trace.as_ref() {
            state.network.reveal_layer(trace, step as usize);
        }
    }

    if step < game.game_type.last_animation_step() {
        return Ok(TurnState {
            phase: Phase::Animating,
            ..state
        });
    }

    let (_, board) = decode(&game)?;
    Ok(TurnState {
        phase: phase_after(&game),
        game: Some(game),
        board: Some(board),
        ranked_moves,
        ..state
    })
}

fn history_selected(mut state: TurnState, record: MoveRecord) -> Result<TurnState, CodecError> {
    let Some(game) = state.game.as_mut() else {
        warn!("No game cached, ignoring move history selection");
        return Ok(state);
    };

    let board = record.board(game.player_1_piece, game.player_2_piece)?;
    game.board_state = record.move_event.post_move_state.clone();
    state.board = Some(board);
    if let Some(trace) = record.trace.as_ref() {
        state.network.load_trace(trace);
    }
    state.trace = record.trace;
    Ok(state)
}
