//! 网络通信模块
//!
//! 通过 REST 接口与游戏服务交互，调用方通过 [`GameService`] 抽象访问，
//! 便于在测试中替换为内存实现

mod retry;

pub use retry::{run_with_retry, run_with_retry_if, BackoffCurve, RetryPolicy};

use std::time::Duration;

use async_trait::async_trait;
use protocol::{
    Game, GameType, MinimaxMoveResponse, MoveOutcome, MoveRecord, MoveRequest,
    NeuralMoveResponse, NewGameRequest, NewGameResponse, Position, API_PREFIX,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// 客户端错误
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// 是否值得重试：网络与状态码错误可能是暂时的，响应体无法解析则重试也无用
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => !e.is_decode(),
            ClientError::Status { .. } => true,
            ClientError::Decode(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// 游戏服务抽象
#[async_trait]
pub trait GameService: Send + Sync {
    /// 获取对局
    async fn fetch_game(&self, uuid: &str) -> Result<Game>;

    /// 人类落子，返回服务端（含 AI 回应）的新局面
    async fn send_move(&self, uuid: &str, game_type: GameType, position: Position) -> Result<MoveOutcome>;

    /// 获取走棋历史（首条为开局前的空棋盘）
    async fn fetch_history(&self, uuid: &str) -> Result<Vec<MoveRecord>>;

    /// 创建新对局
    async fn create_game(&self, request: &NewGameRequest) -> Result<NewGameResponse>;
}

/// 基于 reqwest 的 HTTP 实现
pub struct HttpGameService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGameService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn game_url(&self, uuid: &str) -> String {
        format!("{}{}/game/{}", self.base_url, API_PREFIX, uuid)
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let url = resp.url().to_string();
        if !status.is_success() {
            return Err(ClientError::Status { status, url });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl GameService for HttpGameService {
    async fn fetch_game(&self, uuid: &str) -> Result<Game> {
        let url = self.game_url(uuid);
        debug!("GET {}", url);
        let resp = self.client.get(&url).send().await?;
        Self::read_json(resp).await
    }

    async fn send_move(&self, uuid: &str, game_type: GameType, position: Position) -> Result<MoveOutcome> {
        let url = format!("{}/{}", self.game_url(uuid), game_type.move_endpoint());
        debug!("POST {} position={}", url, position);
        let resp = self
            .client
            .post(&url)
            .json(&MoveRequest::human(position))
            .send()
            .await?;

        let outcome: MoveOutcome = match game_type {
            GameType::Minimax => Self::read_json::<MinimaxMoveResponse>(resp).await?.into(),
            GameType::NeuralNetwork => Self::read_json::<NeuralMoveResponse>(resp).await?.into(),
        };
        Ok(outcome)
    }

    async fn fetch_history(&self, uuid: &str) -> Result<Vec<MoveRecord>> {
        let url = format!("{}/history", self.game_url(uuid));
        debug!("GET {}", url);
        let resp = self.client.get(&url).send().await?;
        Self::read_json(resp).await
    }

    async fn create_game(&self, request: &NewGameRequest) -> Result<NewGameResponse> {
        let url = format!("{}{}/game", self.base_url, API_PREFIX);
        debug!("POST {} type={:?}", url, request.game_type);
        let resp = self.client.post(&url).json(request).send().await?;
        Self::read_json(resp).await
    }
}
