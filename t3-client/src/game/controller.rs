//! 回合控制器
//!
//! 事件处理器负责网络请求和动画延迟，把结果作为动作交给 `reduce`，
//! 再根据新状态决定是否把下一步动画入队

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use protocol::{Game, GameType, MoveRecord, Position};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::event::{Action, GameEvent};
use super::state::{reduce, Phase, TurnState};
use crate::network::{run_with_retry_if, ClientError, GameService, RetryPolicy};
use crate::queue::{EventHandler, EventQueue};
use crate::settings::ClientSettings;

/// 动画步间隔
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTiming {
    pub minimax_step_delay: Duration,
    pub neural_step_delay: Duration,
}

impl AnimationTiming {
    pub fn step_delay(&self, game_type: GameType) -> Duration {
        match game_type {
            GameType::Minimax => self.minimax_step_delay,
            GameType::NeuralNetwork => self.neural_step_delay,
        }
    }
}

impl From<&ClientSettings> for AnimationTiming {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            minimax_step_delay: settings.minimax_step_delay(),
            neural_step_delay: settings.neural_step_delay(),
        }
    }
}

/// 控制器内部状态，作为事件队列的处理器
struct ControllerCore {
    uuid: String,
    service: Arc<dyn GameService>,
    retry: RetryPolicy,
    timing: AnimationTiming,
    state: Mutex<TurnState>,
    state_tx: watch::Sender<TurnState>,
    queue: Arc<EventQueue<GameEvent>>,
}

impl ControllerCore {
    /// 执行状态转移并发布新状态
    async fn dispatch(&self, action: Action) -> TurnState {
        let mut state = self.state.lock().await;
        let next = reduce(std::mem::take(&mut *state), action);
        *state = next.clone();
        self.state_tx.send_replace(next.clone());
        next
    }

    async fn snapshot(&self) -> TurnState {
        self.state.lock().await.clone()
    }

    async fn load_game(&self) {
        let fetched = run_with_retry_if(&self.retry, ClientError::is_transient, || {
            self.service.fetch_game(&self.uuid)
        })
        .await;
        match fetched {
            Ok(game) => {
                info!("Loaded game {} ({:?})", game.uuid, game.game_type);
                self.dispatch(Action::Loaded(game)).await;
            }
            Err(e) => {
                error!("Failed to load game {}: {}", self.uuid, e);
                self.dispatch(Action::Failed { cause: e.to_string() }).await;
            }
        }
    }

    async fn human_move(&self, position: Position) -> anyhow::Result<()> {
        let state = self.snapshot().await;
        if state.phase != Phase::PlayerTurn {
            warn!("Ignoring move at {} in phase {:?}", position, state.phase);
            return Ok(());
        }
        if !state.can_play(position) {
            warn!("Ignoring move at occupied cell {}", position);
            return Ok(());
        }
        let game_type = state.game_type().context("no game loaded")?;

        let outcome = match run_with_retry_if(&self.retry, ClientError::is_transient, || {
            self.service.send_move(&self.uuid, game_type, position)
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to send move {}: {}", position, e);
                self.dispatch(Action::Failed { cause: e.to_string() }).await;
                return Ok(());
            }
        };

        debug!(
            "Move {} accepted, terminal={:?}",
            position, outcome.game.terminal_state
        );
        let game = outcome.game.clone();
        let ranked_moves = outcome.ranked_moves.clone();
        let next = self
            .dispatch(Action::HumanMoved {
                game: outcome.game,
                trace: outcome.trace,
                ranked_moves: outcome.ranked_moves,
            })
            .await;

        if next.phase == Phase::AiTurn {
            self.queue.enqueue(GameEvent::AnimationStep {
                step: 0,
                game,
                ranked_moves,
            });
        }
        Ok(())
    }

    async fn animation_step(&self, step: u8, game: Game, ranked_moves: Option<Vec<Position>>) {
        if step > 0 {
            tokio::time::sleep(self.timing.step_delay(game.game_type)).await;
        }

        let last_step = game.game_type.last_animation_step();
        let next = self
            .dispatch(Action::AnimationStepped {
                step,
                game: game.clone(),
                ranked_moves: ranked_moves.clone(),
            })
            .await;

        if next.phase == Phase::Animating && step < last_step {
            self.queue.enqueue(GameEvent::AnimationStep {
                step: step + 1,
                game,
                ranked_moves,
            });
        }
    }
}

#[async_trait]
impl EventHandler<GameEvent> for ControllerCore {
    async fn handle(&self, event: GameEvent) -> anyhow::Result<()> {
        match event {
            GameEvent::LoadGame => self.load_game().await,
            GameEvent::HumanMove { position } => self.human_move(position).await?,
            GameEvent::AnimationStep {
                step,
                game,
                ranked_moves,
            } => self.animation_step(step, game, ranked_moves).await,
            GameEvent::SetMoveHistory(record) => {
                self.dispatch(Action::MoveHistorySelected(record)).await;
            }
            GameEvent::Error { cause } => {
                self.dispatch(Action::Failed { cause }).await;
            }
        }
        Ok(())
    }
}

/// 回合控制器
///
/// 一个实例对应一局游戏。`mount` 后由后台任务消费事件队列，
/// 视图通过 `subscribe` 获取状态更新。
pub struct TurnController {
    core: Arc<ControllerCore>,
    state_rx: watch::Receiver<TurnState>,
    drain_interval: Duration,
    consumer: Option<JoinHandle<()>>,
}

impl TurnController {
    pub fn new(uuid: impl Into<String>, service: Arc<dyn GameService>, settings: &ClientSettings) -> Self {
        let (state_tx, state_rx) = watch::channel(TurnState::new());
        let core = ControllerCore {
            uuid: uuid.into(),
            service,
            retry: settings.retry_policy(),
            timing: AnimationTiming::from(settings),
            state: Mutex::new(TurnState::new()),
            state_tx,
            queue: Arc::new(EventQueue::new()),
        };

        Self {
            core: Arc::new(core),
            state_rx,
            drain_interval: settings.drain_interval(),
            consumer: None,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.core.uuid
    }

    /// 开始加载对局并启动后台消费任务
    pub fn mount(&mut self) {
        if self.consumer.is_some() {
            return;
        }
        info!("Mounting controller for game {}", self.core.uuid);
        self.core.queue.enqueue(GameEvent::LoadGame);

        let core = self.core.clone();
        let interval = self.drain_interval;
        self.consumer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = core.queue.notified() => {}
                    _ = ticker.tick() => {}
                }
                core.queue.drain(core.as_ref()).await;
            }
        }));
    }

    /// 停止后台任务并丢弃未处理事件
    pub fn unmount(&mut self) {
        if let Some(handle) = self.consumer.take() {
            info!("Unmounting controller for game {}", self.core.uuid);
            handle.abort();
        }
        self.core.queue.clear();
    }

    pub fn is_mounted(&self) -> bool {
        self.consumer.is_some()
    }

    /// 请求落子（是否生效由处理器根据阶段判断）
    pub fn play_move(&self, position: Position) -> bool {
        self.core.queue.enqueue(GameEvent::HumanMove { position })
    }

    /// 复盘时选中一步
    pub fn review(&self, record: MoveRecord) -> bool {
        self.core.queue.enqueue(GameEvent::SetMoveHistory(record))
    }

    pub fn report_error(&self, cause: impl Into<String>) -> bool {
        self.core.queue.enqueue(GameEvent::Error { cause: cause.into() })
    }

    /// 在当前任务中处理排队事件（未 mount 时使用）
    pub async fn drain(&self) -> usize {
        self.core.queue.drain(self.core.as_ref()).await
    }

    /// 当前状态快照
    pub fn state(&self) -> TurnState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TurnState> {
        self.state_rx.clone()
    }

    pub fn queue(&self) -> &EventQueue<GameEvent> {
        &self.core.queue
    }
}

impl Drop for TurnController {
    fn drop(&mut self) {
        self.unmount();
    }
}
