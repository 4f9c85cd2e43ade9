//! # Neurobot Control
//!
//! 安全与运动控制管线（不含控制循环本身）：
//!
//! - `transform`: 跟踪空间 → 机器人空间的位姿变换、欧拉角约定转换
//! - `repulsion`: 势场避障控制器（平滑制动偏移 + 急停判定）
//! - `update`: 类型化的配置更新与跨线程更新队列
//! - `shared`: 控制循环与消息线程共享的控制器句柄
//! - `tracker`: 跟踪帧、最新值存储、双线圈几何
//! - `settings`: TOML 配置文件
//!
//! # 数据流
//!
//! ```text
//! TrackerStore ──▶ PoseTransformer ──▶ coil_geometry ──▶ RepulsionController
//!                                                              │
//!                     RobotClient::move_linear ◀── offset ─────┘
//! ```

mod error;
pub mod repulsion;
pub mod settings;
pub mod shared;
pub mod tracker;
pub mod transform;
pub mod update;

pub use error::ControlError;
pub use repulsion::{
    RepulsionConfig, RepulsionController, RepulsionOutput, Zone, approach_magnitude,
    working_magnitude,
};
pub use settings::ControlSettings;
pub use shared::SharedRepulsion;
pub use tracker::{
    CoilGeometry, LatestValue, RobotPoseStore, TrackerFrame, TrackerSlot, TrackerStore,
    coil_geometry,
};
pub use transform::{
    Calibration, PoseTransformer, TransformOutcome, matrix_to_pose, pose_to_matrix,
};
pub use update::{
    ConfigKey, ConfigUpdate, ConfigUpdateQueue, ConfigUpdateSender, RejectReason, RejectedKey,
    UpdateReport, UpdateValue, config_update_channel,
};
