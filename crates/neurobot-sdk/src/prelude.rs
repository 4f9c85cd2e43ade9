//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use neurobot_sdk::prelude::*;
//! ```

// 协议层
pub use crate::protocol::{Axis, Direction, ForceTorque, MotionState, Pose6};

// 驱动层
pub use crate::driver::{BufferedForceSensor, ClientConfig, ForceSensorConfig, RobotClient, Transport};

// 控制层
pub use crate::control::{
    Calibration, CoilGeometry, ConfigUpdate, PoseTransformer, RepulsionConfig,
    RepulsionController, RepulsionOutput, SharedRepulsion, TrackerFrame, TrackerStore,
    TransformOutcome, Zone, coil_geometry, config_update_channel,
};

// 错误类型
pub use crate::control::ControlError;
pub use crate::driver::{DriverError, LinkError};
pub use crate::protocol::ProtocolError;
