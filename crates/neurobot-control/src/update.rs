//! 配置更新
//!
//! 导航软件通过消息中继下发的配置更新是无类型的键值映射。这里把它收敛为：
//!
//! - 封闭的键集合 [`ConfigKey`]
//! - 保留原始键名的更新 [`ConfigUpdate`]（未知键在应用时逐个拒绝）
//! - 逐键结果 [`UpdateReport`]
//!
//! 更新通过 [`config_update_channel`] 投递到拥有控制器的控制循环线程，
//! 由该线程在两个控制周期之间调用 [`ConfigUpdateQueue::drain_into`]。

use crate::error::ControlError;
use crate::repulsion::{RepulsionConfig, RepulsionController};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// 可更新的配置键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Strength,
    SafetyMargin,
    Ema,
    StopDistance,
    WorkingDistance,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::Strength,
        ConfigKey::SafetyMargin,
        ConfigKey::Ema,
        ConfigKey::StopDistance,
        ConfigKey::WorkingDistance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Strength => "strength",
            ConfigKey::SafetyMargin => "safety_margin",
            ConfigKey::Ema => "ema",
            ConfigKey::StopDistance => "stop_distance",
            ConfigKey::WorkingDistance => "working_distance",
        }
    }

    pub fn read(&self, cfg: &RepulsionConfig) -> f64 {
        match self {
            ConfigKey::Strength => cfg.strength,
            ConfigKey::SafetyMargin => cfg.safety_margin,
            ConfigKey::Ema => cfg.ema,
            ConfigKey::StopDistance => cfg.stop_distance,
            ConfigKey::WorkingDistance => cfg.working_distance,
        }
    }

    pub fn write(&self, cfg: &mut RepulsionConfig, value: f64) {
        match self {
            ConfigKey::Strength => cfg.strength = value,
            ConfigKey::SafetyMargin => cfg.safety_margin = value,
            ConfigKey::Ema => cfg.ema = value,
            ConfigKey::StopDistance => cfg.stop_distance = value,
            ConfigKey::WorkingDistance => cfg.working_distance = value,
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个键被拒绝的原因
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// 不在 [`ConfigKey`] 集合中
    UnknownKey,
    /// 值不是数值（附带原始值的文本）
    NotNumeric(String),
    /// NaN 或无穷大
    NonFinite,
}

/// 被拒绝的键
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedKey {
    pub key: String,
    pub reason: RejectReason,
}

/// 更新值（保留无法解析的原始值，以便逐键拒绝）
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    Number(f64),
    Invalid(String),
}

impl UpdateValue {
    pub fn as_number(&self) -> Result<f64, RejectReason> {
        match self {
            UpdateValue::Number(v) if v.is_finite() => Ok(*v),
            UpdateValue::Number(_) => Err(RejectReason::NonFinite),
            UpdateValue::Invalid(raw) => Err(RejectReason::NotNumeric(raw.clone())),
        }
    }
}

/// 一次配置更新（按键名保序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
    entries: Vec<(String, UpdateValue)>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个数值键（链式）
    pub fn set(mut self, key: impl Into<String>, value: f64) -> Self {
        self.entries.push((key.into(), UpdateValue::Number(value)));
        self
    }

    /// 从消息中继的 JSON 载荷解析
    ///
    /// 非对象载荷整体拒绝；对象内的非数值字段保留下来，应用时逐键拒绝。
    pub fn from_json(value: &Value) -> Result<Self, ControlError> {
        let map = value.as_object().ok_or_else(|| {
            warn!("Rejected repulsion config update: not a mapping ({})", value);
            ControlError::UpdateNotMapping(json_kind(value).to_string())
        })?;

        let entries = map
            .iter()
            .map(|(key, raw)| {
                let value = match raw.as_f64() {
                    Some(v) => UpdateValue::Number(v),
                    None => UpdateValue::Invalid(raw.to_string()),
                };
                (key.clone(), value)
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, UpdateValue)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ConfigUpdate {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), UpdateValue::Number(v)))
                .collect(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 逐键应用结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub applied: Vec<(ConfigKey, f64)>,
    pub rejected: Vec<RejectedKey>,
}

impl UpdateReport {
    pub fn all_applied(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// 创建配置更新通道
///
/// 发送端交给消息线程，接收端留在拥有控制器的控制循环线程。
pub fn config_update_channel() -> (ConfigUpdateSender, ConfigUpdateQueue) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ConfigUpdateSender { tx }, ConfigUpdateQueue { rx })
}

/// 配置更新发送端（可克隆，不阻塞）
#[derive(Debug, Clone)]
pub struct ConfigUpdateSender {
    tx: Sender<ConfigUpdate>,
}

impl ConfigUpdateSender {
    pub fn send(&self, update: ConfigUpdate) -> Result<(), ControlError> {
        self.tx.send(update).map_err(|_| ControlError::ChannelClosed)
    }
}

/// 配置更新接收端
#[derive(Debug)]
pub struct ConfigUpdateQueue {
    rx: Receiver<ConfigUpdate>,
}

impl ConfigUpdateQueue {
    /// 取出一个待处理的更新
    pub fn try_next(&self) -> Option<ConfigUpdate> {
        match self.rx.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// 按到达顺序把所有待处理更新应用到控制器
    pub fn drain_into(&self, controller: &mut RepulsionController) -> Vec<UpdateReport> {
        let mut reports = Vec::new();
        while let Some(update) = self.try_next() {
            reports.push(controller.update_config(&update));
        }
        reports
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
