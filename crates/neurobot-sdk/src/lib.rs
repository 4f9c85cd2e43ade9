//! Neurobot SDK - 神经导航机械臂安全与运动控制
//!
//! 在导航线圈定位过程中保证机械臂不与患者或另一台协作机器人碰撞。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 位姿类型、命令编码、回复解码，无 IO
//! - **驱动层** (`driver`): TCP 传输与机器人操作封装
//! - **控制层** (`control`): 位姿变换、势场避障、配置更新
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use neurobot_sdk::prelude::*;
//!
//! neurobot_sdk::init_logger();
//!
//! let mut robot = RobotClient::new(ClientConfig::default());
//! robot.connect()?;
//!
//! let mut repulsion = RepulsionController::default();
//! let out = repulsion.compute_offset(Some(50.0), 0.01);
//! if out.stop_now {
//!     robot.stop_robot()?;
//! }
//! # Ok::<(), DriverError>(())
//! ```
//!
//! 控制循环本身（节拍、线程生命周期）由调用方负责。

pub use neurobot_control as control;
pub use neurobot_driver as driver;
pub use neurobot_protocol as protocol;

pub mod prelude;

// --- 用户以此为界 ---

pub use protocol::{Command, ForceTorque, MotionState, Pose6, ProtocolError};

pub use driver::{
    BufferedForceSensor, ClientConfig, DriverError, LinkError, RobotClient, TcpTransport, Transport,
};

pub use control::{
    Calibration, ConfigUpdate, ControlError, ControlSettings, PoseTransformer,
    RepulsionConfig, RepulsionController, RepulsionOutput, SharedRepulsion, TrackerFrame,
};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// 未设置 `RUST_LOG` 时的默认过滤指令
pub const DEFAULT_LOG_FILTER: &str = "neurobot=info";

static LOGGER: Once = Once::new();

/// 初始化日志
///
/// 安装 `tracing` fmt 订阅者，过滤规则取自 `RUST_LOG`（缺省为 [`DEFAULT_LOG_FILTER`]），
/// 并把 `log` 生态的记录转发到 `tracing`。重复调用无效果；
/// 若进程已安装了其它全局订阅者，保持原订阅者不变。
pub fn init_logger() {
    LOGGER.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_log::LogTracer::builder()
            .with_max_level(log::LevelFilter::Trace)
            .init();

        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("Global tracing subscriber already installed");
        }
    });
}
