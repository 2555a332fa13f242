//! 神经网络可视化模型
//!
//! 只保存各层激活值，用于逐层揭示 AI 的计算过程

use protocol::{BitBoard, Trace, NETWORK_LAYER_SIZES};
use tracing::warn;

/// 网络层
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub activations: Vec<f32>,
}

impl Layer {
    pub fn zeros(size: usize) -> Self {
        Self {
            activations: vec![0.0; size],
        }
    }

    pub fn size(&self) -> usize {
        self.activations.len()
    }
}

/// 可视化网络（输入层 + 3 个隐藏层 + 输出层）
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// 全零网络
    pub fn new() -> Self {
        Self {
            layers: NETWORK_LAYER_SIZES.iter().map(|&size| Layer::zeros(size)).collect(),
        }
    }

    /// 由棋盘初始化输入层的全零网络
    pub fn from_board(bits: &BitBoard) -> Self {
        let mut network = Self::new();
        network.set_input(bits);
        network
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// 用棋盘占位设置输入层
    pub fn set_input(&mut self, bits: &BitBoard) {
        let activations = bits.input_activations();
        if let Some(input) = self.layers.first_mut() {
            input.activations.copy_from_slice(&activations);
        }
    }

    /// 揭示轨迹中的第 `index` 层，返回是否成功
    pub fn reveal_layer(&mut self, trace: &Trace, index: usize) -> bool {
        let (Some(layer), Some(values)) = (self.layers.get_mut(index), trace.layer(index)) else {
            warn!("Trace has no layer {}", index);
            return false;
        };
        if values.len() != layer.size() {
            warn!(
                "Layer {} size mismatch: expected {}, got {}",
                index,
                layer.size(),
                values.len()
            );
            return false;
        }
        layer.activations.copy_from_slice(values);
        true
    }

    /// 用整条轨迹覆盖所有层
    pub fn load_trace(&mut self, trace: &Trace) {
        for index in 0..trace.layer_outputs.len().min(self.layers.len()) {
            self.reveal_layer(trace, index);
        }
    }
}
