//! 走棋历史复盘
//!
//! 服务端返回的第一条记录总是开局前的空棋盘，加载时丢弃。
//! 默认选中最后一步。

use protocol::MoveRecord;
use tracing::debug;

use crate::network::{GameService, Result};

/// 走棋历史及当前选中的步
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoveHistory {
    records: Vec<MoveRecord>,
    current: usize,
}

impl MoveHistory {
    pub fn from_records(records: Vec<MoveRecord>) -> Self {
        let records: Vec<MoveRecord> = records.into_iter().skip(1).collect();
        let current = records.len().saturating_sub(1);
        Self { records, current }
    }

    /// 从服务器获取
    pub async fn fetch(service: &dyn GameService, uuid: &str) -> Result<Self> {
        let records = service.fetch_history(uuid).await?;
        debug!("Fetched {} history records for {}", records.len(), uuid);
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&MoveRecord> {
        self.records.get(self.current)
    }

    /// 选中第 `index` 步，越界时不变并返回 `None`
    pub fn select(&mut self, index: usize) -> Option<&MoveRecord> {
        if index >= self.records.len() {
            return None;
        }
        self.current = index;
        self.records.get(index)
    }

    pub fn previous(&mut self) -> Option<&MoveRecord> {
        let index = self.current.checked_sub(1)?;
        self.select(index)
    }

    pub fn next(&mut self) -> Option<&MoveRecord> {
        self.select(self.current + 1)
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.records.len()
    }

    /// 该步是否为 AI 落子（带网络轨迹）
    pub fn has_trace(&self, index: usize) -> bool {
        self.records
            .get(index)
            .map(|r| r.trace.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{MoveEvent, Trace};

    fn record(sequence: u32, hex: &str, with_trace: bool) -> MoveRecord {
        MoveRecord {
            move_event: MoveEvent {
                move_sequence: sequence,
                player_id: if sequence % 2 == 1 { 1 } else { 2 },
                post_move_state: hex.to_string(),
            },
            trace: with_trace.then(|| Trace::new(vec![vec![0.0; 18]])),
        }
    }

    fn history() -> MoveHistory {
        MoveHistory::from_records(vec![
            record(0, "00000000", false),
            record(1, "00100000", false),
            record(2, "00100001", true),
            record(3, "00110001", false),
        ])
    }

    #[test]
    fn test_drops_first_record_and_selects_last() {
        let history = history();
        assert_eq!(history.len(), 3);
        assert_eq!(history.current_index(), 2);
        assert_eq!(history.current().unwrap().move_event.move_sequence, 3);
    }

    #[test]
    fn test_navigation() {
        let mut history = history();
        assert!(!history.has_next());
        assert!(history.next().is_none());
        assert_eq!(history.current_index(), 2);

        assert_eq!(history.previous().unwrap().move_event.move_sequence, 2);
        assert_eq!(history.previous().unwrap().move_event.move_sequence, 1);
        assert!(!history.has_previous());
        assert!(history.previous().is_none());
        assert_eq!(history.current_index(), 0);

        assert!(history.select(7).is_none());
        assert_eq!(history.current_index(), 0);
        assert_eq!(history.select(1).unwrap().move_event.move_sequence, 2);
    }

    #[test]
    fn test_has_trace() {
        let history = history();
        assert!(!history.has_trace(0));
        assert!(history.has_trace(1));
        assert!(!history.has_trace(9));
    }

    #[test]
    fn test_empty_history() {
        let mut history = MoveHistory::from_records(Vec::new());
        assert!(history.is_empty());
        assert!(history.current().is_none());
        assert!(history.previous().is_none());

        let history = MoveHistory::from_records(vec![record(0, "00000000", false)]);
        assert!(history.is_empty());
    }
}
