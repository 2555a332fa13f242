//! 重试策略
//!
//! 失败后按退避曲线等待再重试，重试次数用尽时返回最后一次的错误

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use protocol::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 退避曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffCurve {
    /// 下一次延迟 = 当前延迟 × 2^剩余次数（100ms, 1.6s, 12.8s, 51.2s）
    #[default]
    RemainingExponent,
    /// 下一次延迟 = 当前延迟 × 2
    Doubling,
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 首次失败后最多再尝试的次数
    pub max_retries: u32,
    /// 首次重试前的等待时间
    pub initial_delay: Duration,
    pub curve: BackoffCurve,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_RETRY_DELAY,
            curve: BackoffCurve::default(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            curve: BackoffCurve::default(),
        }
    }

    pub fn with_curve(mut self, curve: BackoffCurve) -> Self {
        self.curve = curve;
        self
    }

    /// 不重试
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// 计算下一次延迟，`remaining` 为本次扣减前的剩余重试次数
    pub fn next_delay(&self, delay: Duration, remaining: u32) -> Duration {
        let factor = match self.curve {
            BackoffCurve::RemainingExponent => 2u32.saturating_pow(remaining),
            BackoffCurve::Doubling => 2,
        };
        delay.saturating_mul(factor)
    }

    /// 完整的等待时间表（一直失败时每次重试前的等待）
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::with_capacity(self.max_retries as usize);
        let mut delay = self.initial_delay;
        for remaining in (1..=self.max_retries).rev() {
            delays.push(delay);
            delay = self.next_delay(delay, remaining);
        }
        delays
    }
}

/// 执行异步操作，失败时按策略重试
pub async fn run_with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    run_with_retry_if(policy, |_: &E| true, operation).await
}

/// 同 [`run_with_retry`]，但只有 `should_retry` 认可的错误才会重试，其余立即返回
pub async fn run_with_retry_if<T, E, P, F, Fut>(policy: &RetryPolicy, should_retry: P, mut operation: F) -> Result<T, E>
where
    P: Fn(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut remaining = policy.max_retries;
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !should_retry(&e) => {
                warn!("Attempt {} failed with a permanent error: {}", attempt, e);
                return Err(e);
            }
            Err(e) if remaining == 0 => {
                warn!("Giving up after {} attempts: {}", attempt, e);
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "Attempt {} failed: {}, retrying in {:?} ({} retries left)",
                    attempt, e, delay, remaining
                );
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay, remaining);
                remaining -= 1;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_default_schedule() {
        let delays = RetryPolicy::default().delays();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(1_600),
                Duration::from_millis(12_800),
                Duration::from_millis(51_200),
            ]
        );
    }

    #[test]
    fn test_doubling_schedule() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100)).with_curve(BackoffCurve::Doubling);
        assert_eq!(
            policy.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_attempt_count() {
        let attempts = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), String> = run_with_retry(&RetryPolicy::default(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("boom".to_string()) }
        })
        .await;

        assert_eq!(result, Err("boom".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 5);

        let total: Duration = RetryPolicy::default().delays().iter().sum();
        let elapsed = start.elapsed();
        assert!(elapsed >= total);
        assert!(elapsed < total + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failures() {
        let attempts = AtomicU32::new(0);

        let result: Result<u32, String> = run_with_retry(&RetryPolicy::default(), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(format!("attempt {}", n))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_does_not_sleep() {
        let start = Instant::now();
        let result: Result<&str, String> =
            run_with_retry(&RetryPolicy::default(), || async { Ok("ok") }).await;
        assert_eq!(result, Ok("ok"));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_no_retries() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), String> = run_with_retry(&RetryPolicy::none(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err("nope".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), String> = run_with_retry_if(
            &RetryPolicy::default(),
            |e: &String| e.starts_with("transient"),
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        Err("transient".to_string())
                    } else {
                        Err("malformed".to_string())
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Err("malformed".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }
}
