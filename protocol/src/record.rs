//! 走棋记录与网络轨迹

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::Result;
use crate::piece::{Piece, Position};

/// 神经网络前向传播轨迹
///
/// 每层一个输出向量，下标 0 为输入层
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "layerOutputs")]
    pub layer_outputs: Vec<Vec<f32>>,
}

impl Trace {
    pub fn new(layer_outputs: Vec<Vec<f32>>) -> Self {
        Self { layer_outputs }
    }

    /// 第 `index` 层输出
    pub fn layer(&self, index: usize) -> Option<&[f32]> {
        self.layer_outputs.get(index).map(Vec::as_slice)
    }

    /// 输出层
    pub fn output_layer(&self) -> Option<&[f32]> {
        self.layer_outputs.last().map(Vec::as_slice)
    }

    /// 按输出值从高到低排列的位置（稳定排序，同值保持原顺序）
    pub fn ranked_moves(&self) -> Vec<Position> {
        let Some(outputs) = self.output_layer() else {
            return Vec::new();
        };

        let mut indexed: Vec<(usize, f32)> = outputs.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1));
        indexed
            .into_iter()
            .filter_map(|(i, _)| Position::new(i))
            .collect()
    }
}

/// 单步走棋事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvent {
    pub move_sequence: u32,
    pub player_id: u8,
    /// 走棋后的十六进制位棋盘
    pub post_move_state: String,
}

/// 走棋记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub move_event: MoveEvent,
    #[serde(default)]
    pub trace: Option<Trace>,
}

impl MoveRecord {
    /// 解码该步之后的棋盘
    pub fn board(&self, player_1_piece: Piece, player_2_piece: Piece) -> Result<Board> {
        Board::decode(&self.move_event.post_move_state, player_1_piece, player_2_piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_moves_descending() {
        let trace = Trace::new(vec![
            vec![0.0; 18],
            vec![0.1, 0.9, 0.3, 0.0, 0.8, 0.2, 0.0, 0.0, 0.5],
        ]);
        let numbers: Vec<u8> = trace.ranked_moves().iter().map(|p| p.number()).collect();
        assert_eq!(numbers, vec![2, 5, 9, 3, 6, 1, 4, 7, 8]);
    }

    #[test]
    fn test_ranked_moves_total_order() {
        let trace = Trace::new(vec![vec![0.2, f32::NAN, 0.5, 0.2]]);
        let numbers: Vec<u8> = trace.ranked_moves().iter().map(|p| p.number()).collect();
        assert_eq!(numbers, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_ranked_moves_empty_trace() {
        assert!(Trace::default().ranked_moves().is_empty());
    }

    #[test]
    fn test_move_record_deserialize() {
        let json = r#"[
            {"move_event": {"move_sequence": 0, "player_id": 2, "post_move_state": "00000000"}, "trace": null},
            {"move_event": {"move_sequence": 1, "player_id": 1, "post_move_state": "00100000"}}
        ]"#;
        let records: Vec<MoveRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].trace.is_none());

        let board = records[1].board(Piece::X, Piece::O).unwrap();
        assert_eq!(board.get(Position::new(4).unwrap()), Some(Piece::X));
    }

    #[test]
    fn test_trace_field_name() {
        let trace = Trace::new(vec![vec![1.0]]);
        let json = serde_json::to_value(&trace).unwrap();
        assert!(json.get("layerOutputs").is_some());
    }
}
