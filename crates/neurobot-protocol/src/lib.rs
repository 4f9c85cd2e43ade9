//! # Neurobot Protocol
//!
//! 机械臂控制器 ASCII 行协议定义（无 IO 依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量（端口、结束符、缓冲区大小）
//! - `pose`: 6 自由度位姿 / 力传感器数据
//! - `command`: 命令构建与编码
//! - `reply`: 回复解析
//! - `state`: 运动状态
//!
//! ## 报文格式
//!
//! ```text
//! 请求: <CommandId>,<arg1>,<arg2>,...,;
//! 回复: <CommandId>,<OK|Fail>,<payload...|error_code>,;
//! ```
//!
//! 所有数值均以十进制文本序列化，协议本身不带校验和，
//! 仅依赖 `OK`/`Fail` 应答确认。

pub mod command;
pub mod constants;
pub mod pose;
pub mod reply;
pub mod state;

// 重新导出常用类型
pub use command::*;
pub use constants::*;
pub use pose::*;
pub use reply::*;
pub use state::*;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Empty reply")]
    EmptyReply,

    #[error("Malformed reply: {0:?}")]
    MalformedReply(String),

    #[error("Reply is not valid UTF-8")]
    InvalidEncoding,

    #[error("Invalid numeric field at index {index}: {value:?}")]
    InvalidNumber { index: usize, value: String },

    #[error("Payload too short: expected at least {expected} fields, got {actual}")]
    ShortPayload { expected: usize, actual: usize },

    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid axis index: {0}")]
    InvalidAxis(u8),
}

/// 把一组数值编码为逗号分隔的十进制文本
///
/// Rust 的 `f64` `Display` 实现从不使用科学计数法，满足控制器对纯十进制文本的要求。
pub fn join_values(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}
