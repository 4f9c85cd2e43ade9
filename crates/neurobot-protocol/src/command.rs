//! 命令构建与编码
//!
//! 每个 [`Command`] 对应控制器的一条 ASCII 命令。编码结果不含结束符，
//! 发送前由 [`Command::to_wire`] 追加 [`MESSAGE_TERMINATOR`]。

use crate::constants::MESSAGE_TERMINATOR;
use crate::pose::Pose6;
use crate::{ProtocolError, join_values};
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 笛卡尔空间轴（相对运动使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
    Rx = 3,
    Ry = 4,
    Rz = 5,
}

impl Axis {
    /// 从下标解析轴（0-5）
    pub fn from_index(index: u8) -> Result<Self, ProtocolError> {
        Axis::try_from(index).map_err(|_| ProtocolError::InvalidAxis(index))
    }
}

/// 相对运动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive)]
#[repr(u8)]
pub enum Direction {
    Negative = 0,
    Positive = 1,
}

/// 圆弧运动的附加参数
///
/// 对应 `MoveC` 命令的尾部字段：
/// `FixedPosure,nMoveCType,dRadLen,dVelocity,dAcc,dRadius,sTcpName,sUcsName,strCmdID`
#[derive(Debug, Clone, PartialEq)]
pub struct CircularMoveParams {
    pub fixed_posture: u8,
    pub move_type: u8,
    pub rad_len: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub radius: f64,
    pub tcp_name: String,
    pub ucs_name: String,
    pub command_id: String,
}

impl Default for CircularMoveParams {
    fn default() -> Self {
        Self {
            fixed_posture: 0,
            move_type: 0,
            rad_len: 1.0,
            velocity: 10.0,
            acceleration: 10.0,
            radius: 1.0,
            tcp_name: "TCP".to_string(),
            ucs_name: "Base".to_string(),
            command_id: "0".to_string(),
        }
    }
}

/// 控制器命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 上电（约 44s 才返回）
    Electrify,
    /// 断电（约 3s）
    BlackOut,
    /// 启动主站（约 4s）
    StartMaster,
    /// 关闭主站（约 2s）
    CloseMaster,
    /// 伺服使能
    GrpPowerOn,
    /// 伺服去使能
    GrpPowerOff,
    /// 停止运动
    GrpStop,
    /// 速度比例（0.01-1.0）
    SetOverride { ratio: f64 },
    /// 读取当前位姿
    ReadActPos,
    /// 直线运动到绝对目标
    MoveL { target: Pose6 },
    /// 沿单轴相对直线运动
    MoveRelL {
        axis: Axis,
        direction: Direction,
        distance: f64,
    },
    /// 经过途经点的圆弧运动
    MoveC {
        start: [f64; 3],
        waypoint: [f64; 3],
        target: Pose6,
        params: CircularMoveParams,
    },
    /// 经过途经点的直线运动
    MoveB { waypoint: [f64; 3], target: Pose6 },
    /// 读取力传感器
    ReadForceSensorData,
    /// 读取运动状态
    ReadRobotState,
    /// 回原点
    MoveHoming,
    /// 工具坐标运动开关
    SetToolMotion { enabled: bool },
}

impl Command {
    /// 命令名（回复的第 0 个字段会回显它）
    pub fn name(&self) -> &'static str {
        match self {
            Command::Electrify => "Electrify",
            Command::BlackOut => "BlackOut",
            Command::StartMaster => "StartMaster",
            Command::CloseMaster => "CloseMaster",
            Command::GrpPowerOn => "GrpPowerOn",
            Command::GrpPowerOff => "GrpPowerOff",
            Command::GrpStop => "GrpStop",
            Command::SetOverride { .. } => "SetOverride",
            Command::ReadActPos => "ReadActPos",
            Command::MoveL { .. } => "MoveL",
            Command::MoveRelL { .. } => "MoveRelL",
            Command::MoveC { .. } => "MoveC",
            Command::MoveB { .. } => "MoveB",
            Command::ReadForceSensorData => "ReadForceSensorData",
            Command::ReadRobotState => "ReadRobotState",
            Command::MoveHoming => "MoveHoming",
            Command::SetToolMotion { .. } => "SetToolMotion",
        }
    }

    /// 编码为命令行（不含结束符）
    ///
    /// `robot_id` 只会出现在按机器人组寻址的命令里。
    pub fn encode(&self, robot_id: u8) -> String {
        let name = self.name();
        match self {
            Command::Electrify
            | Command::BlackOut
            | Command::StartMaster
            | Command::CloseMaster
            | Command::ReadForceSensorData => name.to_string(),

            Command::GrpPowerOn
            | Command::GrpPowerOff
            | Command::GrpStop
            | Command::ReadActPos
            | Command::ReadRobotState
            | Command::MoveHoming => format!("{},{}", name, robot_id),

            Command::SetOverride { ratio } => format!("{},{},{}", name, robot_id, ratio),

            Command::MoveL { target } => {
                format!("{},{},{}", name, robot_id, join_values(target.as_array()))
            },

            Command::MoveRelL {
                axis,
                direction,
                distance,
            } => format!(
                "{},{},{},{},{}",
                name,
                robot_id,
                u8::from(*axis),
                u8::from(*direction),
                distance
            ),

            Command::MoveC {
                start,
                waypoint,
                target,
                params,
            } => format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                name,
                robot_id,
                join_values(start),
                join_values(waypoint),
                join_values(target.as_array()),
                params.fixed_posture,
                params.move_type,
                params.rad_len,
                params.velocity,
                params.acceleration,
                params.radius,
                params.tcp_name,
                params.ucs_name,
                params.command_id
            ),

            Command::MoveB { waypoint, target } => format!(
                "{},{},{},{}",
                name,
                robot_id,
                join_values(waypoint),
                join_values(target.as_array())
            ),

            Command::SetToolMotion { enabled } => {
                format!("{},{},{}", name, robot_id, u8::from(*enabled))
            },
        }
    }

    /// 编码为线上字节（追加结束符）
    pub fn to_wire(&self, robot_id: u8) -> Vec<u8> {
        let mut line = self.encode(robot_id);
        line.push_str(MESSAGE_TERMINATOR);
        line.into_bytes()
    }
}
