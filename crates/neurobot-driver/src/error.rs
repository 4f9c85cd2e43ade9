//! 驱动层错误类型定义

use crate::transport::LinkError;
use neurobot_protocol::ProtocolError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误（连接失败、接收超时、对端关闭）
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// 回复解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 未连接（从未连接或超时后已断开）
    #[error("Not connected to robot controller")]
    NotConnected,

    /// 控制器返回 `Fail`
    #[error("Command {command} failed with error code {code}")]
    CommandFailed { command: String, code: String },

    /// 控制器返回了无法识别的状态字段
    #[error("Command {command} returned unexpected status {status:?}")]
    UnexpectedStatus { command: String, status: String },

    /// 参数越界或非有限值
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 力传感器未启用
    #[error("Force sensor is disabled")]
    ForceSensorDisabled,
}

impl DriverError {
    /// 该错误是否意味着连接已不可用（调用方应重连）
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            DriverError::NotConnected
                | DriverError::Link(LinkError::Timeout)
                | DriverError::Link(LinkError::Closed)
                | DriverError::Link(LinkError::Io(_))
        )
    }
}
