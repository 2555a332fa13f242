//! 悬停交互状态
//!
//! 棋盘格与网络神经元互相高亮：格子 `i` 对应输入层神经元 `i`（1 号玩家）、
//! `i + 9`（2 号玩家）以及输出层神经元 `i`

use protocol::{Position, BOARD_CELLS, NETWORK_LAYER_SIZES};

/// 输出层下标
pub const OUTPUT_LAYER: usize = NETWORK_LAYER_SIZES.len() - 1;

/// 神经元定位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeuronRef {
    pub layer: usize,
    pub neuron: usize,
}

impl NeuronRef {
    pub fn new(layer: usize, neuron: usize) -> Self {
        Self { layer, neuron }
    }
}

/// 与格子关联的三个神经元
pub fn neurons_for_cell(pos: Position) -> [NeuronRef; 3] {
    let i = pos.index();
    [
        NeuronRef::new(0, i),
        NeuronRef::new(0, i + BOARD_CELLS),
        NeuronRef::new(OUTPUT_LAYER, i),
    ]
}

/// 与神经元关联的格子（隐藏层神经元没有）
pub fn cell_for_neuron(neuron: NeuronRef) -> Option<Position> {
    match neuron.layer {
        0 => Position::new(neuron.neuron % BOARD_CELLS).filter(|_| neuron.neuron < 2 * BOARD_CELLS),
        OUTPUT_LAYER => Position::new(neuron.neuron),
        _ => None,
    }
}

/// 当前悬停的格子和神经元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub hovered_cell: Option<Position>,
    pub hovered_neuron: Option<NeuronRef>,
}

impl InteractionState {
    pub fn hover_cell(&mut self, cell: Option<Position>) {
        self.hovered_cell = cell;
    }

    pub fn hover_neuron(&mut self, neuron: Option<NeuronRef>) {
        self.hovered_neuron = neuron;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// 格子是否需要高亮
    pub fn is_cell_emphasized(&self, pos: Position) -> bool {
        self.hovered_cell == Some(pos) || self.hovered_neuron.and_then(cell_for_neuron) == Some(pos)
    }

    /// 神经元是否需要高亮
    pub fn is_neuron_emphasized(&self, neuron: NeuronRef) -> bool {
        if self.hovered_neuron == Some(neuron) {
            return true;
        }
        self.hovered_cell
            .map(|cell| neurons_for_cell(cell).contains(&neuron))
            .unwrap_or(false)
    }
}
