//! 位棋盘编解码
//!
//! 线上格式为 8 位十六进制字符串（32 位）：
//! - 高 16 位（前 4 个字符）为 1 号玩家的占位掩码
//! - 低 16 位（后 4 个字符）为 2 号玩家的占位掩码
//!
//! 每个掩码中位置 `i` 对应从最低位数起的第 `i` 位，第 9~15 位保留不用。
//! 换成按最高位优先展开的 32 位数组，位置 `i` 读取下标 `15 - i`（1 号玩家）
//! 与 `31 - i`（2 号玩家）。

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_CELLS, ENCODED_BOARD_LEN, INPUT_LAYER_SIZE};
use crate::error::{CodecError, Result};
use crate::piece::Position;

/// 9 个有效位
const USED_MASK: u16 = (1 << BOARD_CELLS) - 1;

/// 双掩码位棋盘
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitBoard {
    player_1: u16,
    player_2: u16,
}

impl BitBoard {
    /// 空棋盘
    pub fn empty() -> Self {
        Self::default()
    }

    /// 从两个掩码创建，检查占位冲突
    pub fn new(player_1: u16, player_2: u16) -> Result<Self> {
        let board = Self { player_1, player_2 };
        board.check_conflicts()?;
        Ok(board)
    }

    /// 解析 8 位十六进制字符串
    pub fn from_hex(hex: &str) -> Result<Self> {
        let len = hex.chars().count();
        if len != ENCODED_BOARD_LEN {
            return Err(CodecError::invalid(format!(
                "expected {} hex characters, got {}",
                ENCODED_BOARD_LEN, len
            )));
        }

        let mut value: u32 = 0;
        for c in hex.chars() {
            let nibble = c
                .to_digit(16)
                .ok_or_else(|| CodecError::invalid(format!("invalid hex character {:?}", c)))?;
            value = (value << 4) | nibble;
        }

        Self::new((value >> 16) as u16, (value & 0xFFFF) as u16)
    }

    /// 编码为 8 位大写十六进制字符串
    pub fn to_hex(&self) -> String {
        format!("{:04X}{:04X}", self.player_1, self.player_2)
    }

    /// 1 号玩家掩码
    pub fn player_1(&self) -> u16 {
        self.player_1
    }

    /// 2 号玩家掩码
    pub fn player_2(&self) -> u16 {
        self.player_2
    }

    /// 1 号玩家是否占据该位置
    pub fn player_1_at(&self, pos: Position) -> bool {
        self.player_1 & (1 << pos.index()) != 0
    }

    /// 2 号玩家是否占据该位置
    pub fn player_2_at(&self, pos: Position) -> bool {
        self.player_2 & (1 << pos.index()) != 0
    }

    /// 设置某一方在该位置的占位
    pub fn set(&mut self, pos: Position, player_1: bool, player_2: bool) -> Result<()> {
        let bit = 1 << pos.index();
        let (p1, p2) = (
            if player_1 { self.player_1 | bit } else { self.player_1 & !bit },
            if player_2 { self.player_2 | bit } else { self.player_2 & !bit },
        );
        *self = Self::new(p1, p2)?;
        Ok(())
    }

    /// 空格子数
    pub fn empty_cells(&self) -> usize {
        BOARD_CELLS - ((self.player_1 | self.player_2) & USED_MASK).count_ones() as usize
    }

    /// 拼接：1 号玩家（人类）取自 `human_from`，2 号玩家（AI）取自 `ai_from`
    ///
    /// 用于 AI 落子动画开始前隐藏尚未揭示的 AI 棋子
    pub fn splice(human_from: &BitBoard, ai_from: &BitBoard) -> Result<Self> {
        Self::new(human_from.player_1, ai_from.player_2)
    }

    /// 投影为输入层激活值：前 9 个为 1 号玩家，后 9 个为 2 号玩家
    pub fn input_activations(&self) -> [f32; INPUT_LAYER_SIZE] {
        let mut activations = [0.0; INPUT_LAYER_SIZE];
        for pos in Position::all() {
            if self.player_1_at(pos) {
                activations[pos.index()] = 1.0;
            }
            if self.player_2_at(pos) {
                activations[BOARD_CELLS + pos.index()] = 1.0;
            }
        }
        activations
    }

    /// 按最高位优先展开为 32 位数组（每个十六进制字符对应 4 位）
    pub fn bits(&self) -> [u8; 32] {
        let value = ((self.player_1 as u32) << 16) | self.player_2 as u32;
        let mut bits = [0u8; 32];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = ((value >> (31 - i)) & 1) as u8;
        }
        bits
    }

    fn check_conflicts(&self) -> Result<()> {
        let overlap = self.player_1 & self.player_2 & USED_MASK;
        if overlap != 0 {
            return Err(CodecError::ConflictingClaim {
                position: overlap.trailing_zeros() as usize,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(index: usize) -> Position {
        Position::new(index).unwrap()
    }

    #[test]
    fn test_single_player_1_mark() {
        let board = BitBoard::from_hex("00010000").unwrap();
        assert!(board.player_1_at(pos(0)));
        for i in 1..9 {
            assert!(!board.player_1_at(pos(i)));
        }
        for i in 0..9 {
            assert!(!board.player_2_at(pos(i)));
        }
    }

    #[test]
    fn test_bit_index_mapping() {
        // 1 号玩家位置 i 对应展开数组下标 15 - i，2 号玩家对应 31 - i
        for i in 0..9 {
            let p1 = BitBoard::new(1 << i, 0).unwrap();
            assert_eq!(p1.bits()[15 - i], 1);
            assert_eq!(p1.bits().iter().map(|b| *b as u32).sum::<u32>(), 1);

            let p2 = BitBoard::new(0, 1 << i).unwrap();
            assert_eq!(p2.bits()[31 - i], 1);
        }
    }

    #[test]
    fn test_hex_parsing_case_insensitive() {
        let upper = BitBoard::from_hex("01A00054").unwrap();
        let lower = BitBoard::from_hex("01a00054").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.player_1(), 0x01A0);
        assert_eq!(upper.player_2(), 0x0054);
        assert_eq!(lower.to_hex(), "01A00054");
    }

    #[test]
    fn test_invalid_length() {
        for hex in ["", "0001000", "000100000", "0x010000"] {
            assert!(
                matches!(BitBoard::from_hex(hex), Err(CodecError::InvalidEncoding { .. })),
                "{}",
                hex
            );
        }
    }

    #[test]
    fn test_invalid_character() {
        assert!(matches!(
            BitBoard::from_hex("0001000G"),
            Err(CodecError::InvalidEncoding { .. })
        ));
        // 多字节字符
        assert!(matches!(
            BitBoard::from_hex("0001000é"),
            Err(CodecError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn test_conflicting_claim_every_position() {
        for i in 0..9 {
            let mask = 1u16 << i;
            let hex = format!("{:04X}{:04X}", mask, mask);
            assert_eq!(
                BitBoard::from_hex(&hex),
                Err(CodecError::ConflictingClaim { position: i }),
                "position {}",
                i
            );
        }
    }

    #[test]
    fn test_reserved_bits_do_not_conflict() {
        let board = BitBoard::from_hex("80008000").unwrap();
        assert_eq!(board.empty_cells(), 9);
    }

    #[test]
    fn test_splice() {
        // 新局面：人类下在 4，AI 下在 0；旧局面：AI 尚无棋子
        let next = BitBoard::new(1 << 4, 1 << 0).unwrap();
        let prev = BitBoard::empty();
        let spliced = BitBoard::splice(&next, &prev).unwrap();
        assert!(spliced.player_1_at(pos(4)));
        assert!(!spliced.player_2_at(pos(0)));
        assert_eq!(spliced.to_hex(), "00100000");
    }

    #[test]
    fn test_splice_conflict() {
        let human = BitBoard::new(1 << 2, 0).unwrap();
        let ai = BitBoard::new(0, 1 << 2).unwrap();
        assert_eq!(
            BitBoard::splice(&human, &ai),
            Err(CodecError::ConflictingClaim { position: 2 })
        );
    }

    #[test]
    fn test_input_activations() {
        let board = BitBoard::new(0b0_0001_0001, 0b1_0000_0010).unwrap();
        let activations = board.input_activations();
        assert_eq!(activations[0], 1.0);
        assert_eq!(activations[4], 1.0);
        assert_eq!(activations[9 + 1], 1.0);
        assert_eq!(activations[9 + 8], 1.0);
        assert_eq!(activations.iter().sum::<f32>(), 4.0);
    }

    #[test]
    fn test_set() {
        let mut board = BitBoard::empty();
        board.set(pos(3), true, false).unwrap();
        board.set(pos(7), false, true).unwrap();
        assert_eq!(board.empty_cells(), 7);
        assert!(board.set(pos(3), true, true).is_err());
        // 冲突时保持原值
        assert!(board.player_1_at(pos(3)));
    }
}
