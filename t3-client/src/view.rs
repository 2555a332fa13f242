//! 文本视图
//!
//! 状态提示、网络面板开合以及终端下的棋盘渲染

use std::fmt::Write;

use protocol::{Board, Position, TerminalState, BOARD_CELLS};

use crate::game::{Network, Phase, TurnState};
use crate::interaction::InteractionState;

/// 出错时的提示（不显示任何棋盘）
pub const ERROR_MESSAGE: &str = "Oops! Something went wrong. Please refresh.";

/// 网络面板强制开合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelOverride {
    /// 由用户决定
    None,
    Open,
    Closed,
}

/// 状态提示
pub fn status_message(phase: Phase, terminal: Option<TerminalState>) -> &'static str {
    match phase {
        Phase::Loading => "Loading...",
        Phase::PlayerTurn => "Your turn, Human!",
        Phase::AiTurn | Phase::Animating => "The AI is thinking...",
        Phase::GameOver => match terminal {
            Some(TerminalState::HumanWin) => "Human wins!",
            Some(TerminalState::AiWin) => "AI wins!",
            Some(TerminalState::Draw) => "Draw!",
            _ => "Error",
        },
        Phase::Error => "Error",
    }
}

/// 动画中保持展开；没有轨迹可看时保持收起
pub fn panel_override(state: &TurnState) -> PanelOverride {
    match state.phase {
        Phase::PlayerTurn | Phase::GameOver if state.trace.is_none() => PanelOverride::Closed,
        Phase::AiTurn => PanelOverride::Closed,
        Phase::Animating => PanelOverride::Open,
        _ => PanelOverride::None,
    }
}

/// 渲染棋盘
///
/// 空格显示位置编号（1..=9），连成一线的格子用 `[ ]` 标出，悬停高亮用 `< >`；
/// 有着法排名时追加一行
pub fn render_board(board: &Board, ranked_moves: Option<&[Position]>, interaction: &InteractionState) -> String {
    let winning = board.winning_line();
    let mut out = String::new();

    for pos in Position::all() {
        let token = match board.get(pos) {
            Some(piece) => piece.display_char(),
            None => char::from(b'0' + pos.number()),
        };
        let (open, close) = if winning.is_some_and(|line| line.contains(&pos)) {
            ('[', ']')
        } else if interaction.is_cell_emphasized(pos) {
            ('<', '>')
        } else {
            (' ', ' ')
        };
        let _ = write!(out, "{}{}{}", open, token, close);

        match pos.col() {
            2 if pos.index() + 1 < BOARD_CELLS => out.push_str("\n---+---+---\n"),
            2 => {}
            _ => out.push('|'),
        }
    }

    if let Some(ranked) = ranked_moves.filter(|r| !r.is_empty()) {
        let ranking: Vec<String> = ranked.iter().map(Position::to_string).collect();
        let _ = write!(out, "\nAI ranking: {}", ranking.join(" > "));
    }
    out
}

/// 每层一行：大小与最强激活
pub fn render_network(network: &Network) -> String {
    network
        .layers()
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            let strongest = layer
                .activations
                .iter()
                .copied()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(&b.1));
            match strongest {
                Some((index, value)) if value > 0.0 => {
                    format!("L{} [{:>2}] max #{} = {:.2}", i, layer.size(), index, value)
                }
                _ => format!("L{} [{:>2}] idle", i, layer.size()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 完整画面：状态提示 + 棋盘（出错时只显示错误提示）
pub fn render_state(state: &TurnState, interaction: &InteractionState) -> String {
    if state.phase == Phase::Error {
        return ERROR_MESSAGE.to_string();
    }

    let mut out = status_message(state.phase, state.terminal_state()).to_string();
    if let Some(board) = state.board.as_ref() {
        out.push_str("\n\n");
        out.push_str(&render_board(board, state.ranked_moves.as_deref(), interaction));
    }
    out
}
