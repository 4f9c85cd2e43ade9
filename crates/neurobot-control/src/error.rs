//! 控制层错误类型定义

use thiserror::Error;

/// 控制层错误类型
#[derive(Error, Debug)]
pub enum ControlError {
    /// 参考矩阵 X 不可逆
    #[error("Calibration reference matrix is singular")]
    SingularCalibration,

    /// 行优先矩阵元素个数不是 16
    #[error("Invalid matrix: expected 16 elements, got {0}")]
    InvalidMatrixLength(usize),

    /// 配置更新不是键值映射，整体拒绝
    #[error("Config update must be a mapping, got {0}")]
    UpdateNotMapping(String),

    /// 配置更新通道已关闭（控制循环退出）
    #[error("Config update channel closed")]
    ChannelClosed,

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Settings serialize error: {0}")]
    SettingsSerialize(#[from] toml::ser::Error),
}
