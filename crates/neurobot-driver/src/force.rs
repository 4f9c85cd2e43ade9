//! 带缓冲的力/力矩传感器
//!
//! 保存最近 `buffer_size` 次读数（Fz 取反后入队，正值表示压向头皮），
//! 并基于 Fz 历史判断接触力是否接近设定值、是否已稳定。

use crate::client::RobotClient;
use crate::error::DriverError;
use crate::transport::Transport;
use neurobot_protocol::{Axis, ForceTorque};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

const Z_INDEX: usize = 2;

/// 与 `numpy.isclose` 一致的相对容差
const RELATIVE_TOLERANCE: f64 = 1e-5;

/// 力传感器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceSensorConfig {
    /// 是否读取传感器
    pub enabled: bool,
    /// 保留的读数个数
    pub buffer_size: usize,
}

impl Default for ForceSensorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: 50,
        }
    }
}

/// Fz 稳定性判据
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityCriteria {
    /// 平均 Fz 与设定值的最大偏差（N）
    pub setpoint_tolerance: f64,
    /// Fz 标准差上限（N）
    pub threshold_std: f64,
    /// 少于该读数个数时视为不稳定
    pub min_samples: usize,
    /// 参与统计的最近读数个数
    pub window_size: usize,
    /// 统计前是否做 α=0.5 的指数平滑
    pub smoothing: bool,
    /// z 偏移与上次下发值的最小差异（mm）
    pub z_offset_tolerance: f64,
}

impl Default for StabilityCriteria {
    fn default() -> Self {
        Self {
            setpoint_tolerance: 1.5,
            threshold_std: 0.1,
            min_samples: 15,
            window_size: 25,
            smoothing: true,
            z_offset_tolerance: 1.0,
        }
    }
}

/// 带环形缓冲的力传感器
#[derive(Debug, Clone)]
pub struct BufferedForceSensor {
    config: ForceSensorConfig,
    buffer: VecDeque<ForceTorque>,
    last_force_sent: f64,
    last_z_offset_sent: f64,
}

impl BufferedForceSensor {
    pub fn new(config: ForceSensorConfig) -> Self {
        let capacity = config.buffer_size.max(1);
        Self {
            config,
            buffer: VecDeque::with_capacity(capacity),
            last_force_sent: 0.0,
            last_z_offset_sent: 0.0,
        }
    }

    pub fn config(&self) -> &ForceSensorConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.config.buffer_size.max(1)
    }

    /// 读取一次传感器并写入缓冲
    ///
    /// 传感器未启用时不发送命令，返回 [`DriverError::ForceSensorDisabled`]。
    /// 读取失败时缓冲保持不变。
    pub fn update<T: Transport>(
        &mut self,
        client: &mut RobotClient<T>,
    ) -> Result<ForceTorque, DriverError> {
        if !self.config.enabled {
            return Err(DriverError::ForceSensorDisabled);
        }
        match client.try_read_force_sensor() {
            Ok(raw) => Ok(self.record(raw)),
            Err(e) => {
                warn!("Could not read force sensor: {}", e);
                Err(e)
            },
        }
    }

    /// 写入一次原始读数，返回入队后的读数（Fz 已取反）
    pub fn record(&mut self, raw: ForceTorque) -> ForceTorque {
        let mut reading = raw;
        reading.force[Z_INDEX] = -reading.force[Z_INDEX];

        while self.buffer.len() >= self.capacity() {
            self.buffer.pop_front();
        }
        self.buffer.push_back(reading);
        reading
    }

    pub fn latest(&self) -> Option<ForceTorque> {
        self.buffer.back().copied()
    }

    /// 最近一次读数在指定轴上的分量
    pub fn latest_axis(&self, axis: Axis) -> Option<f64> {
        self.latest()
            .map(|reading| reading.to_array()[u8::from(axis) as usize])
    }

    pub fn readings(&self) -> impl Iterator<Item = &ForceTorque> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// 按时间顺序的 Fz 历史
    pub fn force_z_history(&self) -> Vec<f64> {
        self.buffer.iter().map(|r| r.force[Z_INDEX]).collect()
    }

    /// 反馈力是否与上次下发的值不同，不同时记录为新的下发值
    pub fn force_changed(&mut self, feedback: f64, tolerance: f64) -> bool {
        let changed = !is_close(self.last_force_sent, feedback, tolerance);
        if changed {
            self.last_force_sent = feedback;
        }
        changed
    }

    /// 平均 Fz 是否在设定值附近（缓冲为空时视为满足）
    pub fn is_force_near_setpoint(&self, setpoint: f64, threshold: f64) -> bool {
        if self.buffer.is_empty() {
            return true;
        }
        let history = self.force_z_history();
        (mean(&history) - setpoint).abs() <= threshold
    }

    /// Fz 是否已稳定在设定值附近，且 z 偏移相对上次下发值有变化
    ///
    /// 判定为稳定时记录 `z_offset` 为新的下发值，同一偏移不会连续两次判定为稳定。
    pub fn is_force_z_stable(
        &mut self,
        setpoint: f64,
        z_offset: f64,
        criteria: &StabilityCriteria,
    ) -> bool {
        if self.buffer.len() < criteria.min_samples {
            return false;
        }

        let history = self.force_z_history();
        let start = history.len().saturating_sub(criteria.window_size);
        let window = &history[start..];
        if window.is_empty() {
            return false;
        }

        let values = if criteria.smoothing {
            smooth(window)
        } else {
            window.to_vec()
        };
        let avg = mean(&values);
        let std = population_std(&values, avg);

        let stable = std < criteria.threshold_std
            && (avg - setpoint).abs() <= criteria.setpoint_tolerance
            && !is_close(self.last_z_offset_sent, z_offset, criteria.z_offset_tolerance);
        if stable {
            self.last_z_offset_sent = z_offset;
        }
        stable
    }
}

fn is_close(a: f64, b: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + RELATIVE_TOLERANCE * b.abs()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std(values: &[f64], avg: f64) -> f64 {
    let var = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

fn smooth(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::with_capacity(values.len());
    for &v in values {
        let next = match out.last() {
            Some(&prev) => 0.5 * v + 0.5 * prev,
            None => v,
        };
        out.push(next);
    }
    out
}
