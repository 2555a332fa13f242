//! 事件队列
//!
//! 单消费者 FIFO：
//! - 同一时刻最多只有一个处理器调用在执行
//! - 入队时若与队尾事件完全相同则丢弃（只比较队尾）
//! - 处理器出错时记录日志并丢弃该事件

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// 事件处理器
#[async_trait]
pub trait EventHandler<E: Send + 'static>: Send + Sync {
    async fn handle(&self, event: E) -> anyhow::Result<()>;
}

/// 排空期间持有，离开作用域（包括被取消）时清除标记
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 事件队列
pub struct EventQueue<E> {
    events: Mutex<VecDeque<E>>,
    draining: AtomicBool,
    notify: Notify,
}

impl<E> Default for EventQueue<E>
where
    E: Clone + PartialEq + Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E>
where
    E: Clone + PartialEq + Debug + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    fn events(&self) -> MutexGuard<'_, VecDeque<E>> {
        // 锁内不会 panic，中毒时直接取回数据
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 入队，与队尾重复时丢弃并返回 `false`
    pub fn enqueue(&self, event: E) -> bool {
        {
            let mut events = self.events();
            if events.back() == Some(&event) {
                debug!("Dropping duplicate event: {:?}", event);
                return false;
            }
            debug!("Enqueue event: {:?}", event);
            events.push_back(event);
        }
        self.notify.notify_one();
        true
    }

    /// 依次处理队列中的事件直到为空，返回本次处理的事件数
    ///
    /// 已有排空在进行时立即返回 0
    pub async fn drain<H>(&self, handler: &H) -> usize
    where
        H: EventHandler<E> + ?Sized,
    {
        let mut handled = 0;
        loop {
            if self
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return handled;
            }
            let _guard = DrainGuard(&self.draining);

            let next = self.events().pop_front();
            let Some(event) = next else {
                return handled;
            };

            debug!("Handling event: {:?}", event);
            if let Err(e) = handler.handle(event).await {
                warn!("Event handler failed, event dropped: {:#}", e);
            }
            handled += 1;
        }
    }

    /// 等待新事件入队
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    /// 丢弃所有未处理事件
    pub fn clear(&self) {
        let mut events = self.events();
        if !events.is_empty() {
            debug!("Clearing {} pending events", events.len());
        }
        events.clear();
    }

    /// 当前排队事件快照
    pub fn snapshot(&self) -> Vec<E> {
        self.events().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    /// 记录处理顺序与最大并发数
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<&'static str>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl EventHandler<&'static str> for Recorder {
        async fn handle(&self, event: &'static str) -> anyhow::Result<()> {
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.seen.lock().unwrap().push(event);
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on == Some(event) {
                anyhow::bail!("failed on {}", event);
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_without_overlap() {
        let queue = EventQueue::new();
        let recorder = Recorder::default();

        assert!(queue.enqueue("A"));
        assert!(queue.enqueue("B"));
        assert!(queue.enqueue("C"));
        assert_eq!(queue.len(), 3);

        let (first, second) = tokio::join!(queue.drain(&recorder), queue.drain(&recorder));

        assert_eq!(first + second, 3);
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["A", "B", "C"]);
        assert_eq!(recorder.max_active.load(Ordering::SeqCst), 1);
        assert!(queue.is_empty());
        assert!(!queue.is_draining());
    }

    #[test]
    fn test_tail_duplicate_suppression() {
        let queue = EventQueue::new();
        assert!(queue.enqueue("A"));
        assert!(!queue.enqueue("A"));
        assert_eq!(queue.snapshot(), vec!["A"]);

        assert!(queue.enqueue("B"));
        assert!(queue.enqueue("A"));
        assert_eq!(queue.snapshot(), vec!["A", "B", "A"]);
    }

    #[tokio::test]
    async fn test_drain_empty_is_noop() {
        let queue: EventQueue<&'static str> = EventQueue::new();
        let recorder = Recorder::default();
        assert_eq!(queue.drain(&recorder).await, 0);
        assert!(!queue.is_draining());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_error_drops_event() {
        let queue = EventQueue::new();
        let recorder = Recorder {
            fail_on: Some("B"),
            ..Default::default()
        };

        queue.enqueue("A");
        queue.enqueue("B");
        queue.enqueue("C");

        assert_eq!(queue.drain(&recorder).await, 3);
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["A", "B", "C"]);
        assert!(!queue.is_draining());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_drain_releases_flag() {
        let queue = EventQueue::new();
        let recorder = Recorder::default();
        queue.enqueue("A");
        queue.enqueue("B");

        let result = tokio::time::timeout(Duration::from_millis(5), queue.drain(&recorder)).await;
        assert!(result.is_err());
        assert!(!queue.is_draining());

        // 被取消的事件已出队，剩余事件仍可处理
        assert_eq!(queue.drain(&recorder).await, 1);
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["B"]);
    }

    struct Chain {
        queue: Arc<EventQueue<u32>>,
        seen: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl EventHandler<u32> for Chain {
        async fn handle(&self, event: u32) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(event);
            if event < 3 {
                self.queue.enqueue(event + 1);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_events_enqueued_during_drain_are_handled() {
        let queue = Arc::new(EventQueue::new());
        let chain = Chain {
            queue: queue.clone(),
            seen: Mutex::new(Vec::new()),
        };

        queue.enqueue(0);
        assert_eq!(queue.drain(&chain).await, 4);
        assert_eq!(*chain.seen.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_clear() {
        let queue = EventQueue::new();
        queue.enqueue(1u32);
        queue.enqueue(2u32);
        queue.clear();
        assert!(queue.is_empty());
    }
}
