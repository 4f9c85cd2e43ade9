//! TOML 配置文件
//!
//! ```toml
//! [robot]
//! host = "192.168.200.251"
//! port = 10003
//!
//! [repulsion]
//! strength = 240.0
//! safety_margin = 65.0
//!
//! [force_sensor]
//! enabled = true
//! buffer_size = 50
//! ```
//!
//! 缺失的表和字段使用默认值。

use crate::error::ControlError;
use crate::repulsion::RepulsionConfig;
use neurobot_driver::{ClientConfig, ForceSensorConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// 控制进程配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub robot: ClientConfig,
    pub repulsion: RepulsionConfig,
    pub force_sensor: ForceSensorConfig,
}

impl ControlSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, ControlError> {
        Ok(toml::from_str(text)?)
    }

    /// 从文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ControlError> {
        let path = path.as_ref();
        let settings = Self::from_toml_str(&fs::read_to_string(path)?)?;
        info!("Loaded control settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String, ControlError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
