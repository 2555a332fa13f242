//! T-Cubed 客户端
//!
//! 与服务器上的 AI（Minimax 或神经网络）下井字棋：
//! 事件队列串行驱动回合状态机，网络请求带重试，AI 落子后逐层播放网络动画

pub mod game;
pub mod history;
pub mod interaction;
pub mod network;
pub mod queue;
pub mod settings;
pub mod view;

pub use game::{reduce, Action, GameEvent, Phase, TurnController, TurnState};
pub use history::MoveHistory;
pub use interaction::InteractionState;
pub use network::{ClientError, GameService, HttpGameService, RetryPolicy};
pub use queue::{EventHandler, EventQueue};
pub use settings::ClientSettings;
