//! 游戏逻辑模块
//!
//! 回合状态机、AI 动画与驱动它们的控制器

mod controller;
mod event;
mod neural;
mod state;

pub use controller::{AnimationTiming, TurnController};
pub use event::{Action, GameEvent};
pub use neural::{Layer, Network};
pub use state::{reduce, Phase, TurnState};
