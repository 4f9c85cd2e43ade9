//! 驱动层模块
//!
//! 本模块负责与机械臂控制器的 TCP 通信，包括：
//! - 传输抽象（`Transport` trait，默认 TCP 实现）
//! - 请求/应答交换（单次发送、单次接收）
//! - 机器人操作封装（上电、伺服、运动、读取位姿/力/运动状态）
//! - 带缓冲的力传感器（接触力设定值与稳定性判断）
//!
//! # 线程模型
//!
//! `RobotClient` 本身不加锁，同一连接只能由一个线程调用 `send`。
//! 接收超时后客户端进入断开状态，是否重连由调用方决定。

mod client;
mod config;
mod error;
mod force;
pub mod transport;

pub use client::RobotClient;
pub use config::ClientConfig;
pub use error::DriverError;
pub use force::{BufferedForceSensor, ForceSensorConfig, StabilityCriteria};
pub use transport::{LinkError, TcpTransport, Transport};
