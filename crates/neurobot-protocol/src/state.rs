//! 运动状态

use crate::ProtocolError;
use std::fmt;

/// `ReadRobotState` 负载中运动标志的位置
pub const MOVING_FLAG_INDEX: usize = 0;
/// `ReadRobotState` 负载中错误标志的位置
pub const ERROR_FLAG_INDEX: usize = 2;

/// 控制器报告的运动状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionState {
    FreeToMove,
    InMotion,
    Error,
}

impl MotionState {
    /// 由 (moving, error) 两个标志推导，错误优先于运动
    pub fn from_flags(moving: bool, error: bool) -> Self {
        if error {
            MotionState::Error
        } else if moving {
            MotionState::InMotion
        } else {
            MotionState::FreeToMove
        }
    }

    /// 由 `ReadRobotState` 的数值负载推导（非零即为真）
    pub fn from_payload(values: &[f64]) -> Result<Self, ProtocolError> {
        if values.len() <= ERROR_FLAG_INDEX {
            return Err(ProtocolError::ShortPayload {
                expected: ERROR_FLAG_INDEX + 1,
                actual: values.len(),
            });
        }
        Ok(Self::from_flags(
            values[MOVING_FLAG_INDEX] != 0.0,
            values[ERROR_FLAG_INDEX] != 0.0,
        ))
    }

    pub fn is_free(&self) -> bool {
        *self == MotionState::FreeToMove
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MotionState::FreeToMove => "FREE_TO_MOVE",
            MotionState::InMotion => "IN_MOTION",
            MotionState::Error => "ERROR",
        };
        f.write_str(name)
    }
}
