//! 协议常量定义

use std::time::Duration;

/// 棋盘格子数
pub const BOARD_CELLS: usize = 9;

/// 编码后棋盘的十六进制字符数（32 位）
pub const ENCODED_BOARD_LEN: usize = 8;

/// 空棋盘编码
pub const EMPTY_BOARD_HEX: &str = "00000000";

/// 人类玩家 ID（人类总是 1 号玩家）
pub const HUMAN_PLAYER_ID: u8 = 1;

/// AI 玩家 ID
pub const AI_PLAYER_ID: u8 = 2;

/// REST API 前缀
pub const API_PREFIX: &str = "/api/v1";

/// 默认服务器地址
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// 神经网络各层神经元数（输入层 + 3 个隐藏层 + 输出层）
pub const NETWORK_LAYER_SIZES: [usize; 5] = [18, 32, 32, 32, 9];

/// 输入层神经元数（两名玩家各 9 个）
pub const INPUT_LAYER_SIZE: usize = 18;

/// 默认重试次数
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// 默认首次重试延迟（毫秒）
pub const DEFAULT_RETRY_DELAY_MS: u64 = 100;

/// Minimax 模式动画步间隔（毫秒）
pub const MINIMAX_STEP_DELAY_MS: u64 = 250;

/// 神经网络模式动画步间隔（毫秒）
pub const NEURAL_STEP_DELAY_MS: u64 = 500;

/// 事件队列兜底轮询间隔（毫秒）
pub const DRAIN_INTERVAL_MS: u64 = 100;

/// 默认首次重试延迟 Duration
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(DEFAULT_RETRY_DELAY_MS);

/// 事件队列兜底轮询间隔 Duration
pub const DRAIN_INTERVAL: Duration = Duration::from_millis(DRAIN_INTERVAL_MS);
