//! 机器人控制器客户端
//!
//! 每个操作都是 `send` 之上的一对编码/解码：
//!
//! ```text
//! Command ──encode──▶ "<cmd>,<args>,;" ──TCP──▶ 控制器
//!                                                  │
//! Result  ◀──decode── "<cmd>,OK|Fail,<...>"  ◀─────┘
//! ```
//!
//! 失败从不 panic：连接问题体现为断开状态，`Fail` 体现为带错误码的 `Err`。

use crate::config::ClientConfig;
use crate::error::DriverError;
use crate::transport::{LinkError, TcpTransport, Transport};
use neurobot_protocol::{
    Axis, CircularMoveParams, Command, Direction, ForceTorque, MAX_SPEED_RATIO, MIN_SPEED_RATIO,
    MotionState, Pose6, ProtocolError, Reply, ReplyStatus,
};
use tracing::{debug, error, info, warn};

/// `ReadActPos` 回复中，关节角在前、笛卡尔位姿在后时的位姿起始下标
const POSE_OFFSET_AFTER_JOINTS: usize = 6;

/// 笛卡尔位姿的值个数
const POSE_LEN: usize = 6;

/// 控制器客户端
///
/// 同一连接只能由一个线程使用；接收超时后进入断开状态，不会自动重试。
pub struct RobotClient<T: Transport = TcpTransport> {
    config: ClientConfig,
    transport: Option<T>,
}

impl RobotClient<TcpTransport> {
    /// 创建未连接的客户端
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// 连接控制器
    ///
    /// 失败时客户端保持断开状态并返回错误，不会留下半初始化的连接。
    pub fn connect(&mut self) -> Result<(), DriverError> {
        if self.transport.is_some() {
            debug!("Already connected to {}:{}", self.config.host, self.config.port);
            return Ok(());
        }

        match TcpTransport::connect(
            &self.config.host,
            self.config.port,
            self.config.connect_timeout(),
            self.config.receive_timeout(),
        ) {
            Ok(transport) => {
                info!(
                    "Connected to robot controller at {}:{}",
                    self.config.host, self.config.port
                );
                self.transport = Some(transport);
                Ok(())
            },
            Err(e) => {
                error!(
                    "Failed to connect to robot controller at {}:{}: {}",
                    self.config.host, self.config.port, e
                );
                self.transport = None;
                Err(e.into())
            },
        }
    }

    /// 断开后重新连接
    pub fn reconnect(&mut self) -> Result<(), DriverError> {
        self.disconnect();
        self.connect()
    }
}

impl<T: Transport> RobotClient<T> {
    /// 使用已建立的传输创建客户端（视为已连接）
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport: Some(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// 关闭连接
    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            info!("Disconnected from robot controller");
        }
    }

    /// 发送一条命令并读取一次回复（不检查状态）
    ///
    /// 接收超时或对端关闭时进入断开状态。
    pub fn exchange(&mut self, command: &Command) -> Result<Reply, DriverError> {
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;
        let wire = command.to_wire(self.config.robot_id);
        debug!("-> {}", String::from_utf8_lossy(&wire));

        let mut buf = vec![0u8; self.config.reply_buffer_size];
        let received = transport.send(&wire).and_then(|_| transport.receive(&mut buf));
        let n = match received {
            Ok(n) => n,
            Err(e) => {
                match e {
                    LinkError::Timeout => {
                        warn!("Robot connection error: receive timeout on {}", command.name())
                    },
                    ref other => warn!("Robot connection error on {}: {}", command.name(), other),
                }
                self.disconnect();
                return Err(e.into());
            },
        };

        let reply = Reply::from_bytes(&buf[..n])?;
        debug!("<- {}", reply.fields().join(","));
        Ok(reply)
    }

    /// 发送命令并检查状态，成功时返回负载字段
    pub fn send(&mut self, command: &Command) -> Result<Vec<String>, DriverError> {
        let reply = self.exchange(command)?;
        match reply.status() {
            ReplyStatus::Ok => Ok(reply.payload().to_vec()),
            ReplyStatus::Fail => {
                let code = reply.error_code().unwrap_or("").to_string();
                warn!(
                    "The message {} is returning the error code: {}",
                    reply.command(),
                    code
                );
                Err(DriverError::CommandFailed {
                    command: reply.command().to_string(),
                    code,
                })
            },
            ReplyStatus::Unknown(status) => {
                warn!(
                    "The message {} returned unknown status {:?}",
                    reply.command(),
                    status
                );
                Err(DriverError::UnexpectedStatus {
                    command: reply.command().to_string(),
                    status: status.clone(),
                })
            },
        }
    }

    fn send_ack(&mut self, command: &Command) -> Result<(), DriverError> {
        self.send(command).map(|_| ())
    }

    fn send_numeric(&mut self, command: &Command) -> Result<Vec<f64>, DriverError> {
        let payload = self.send(command)?;
        Ok(neurobot_protocol::parse_numbers(&payload[..])?)
    }

    /// 上电（约 44s 后返回）
    pub fn power_up(&mut self) -> Result<(), DriverError> {
        self.send_ack(&Command::Electrify)
    }

    /// 断电（约 3s 后返回）
    pub fn power_outage(&mut self) -> Result<(), DriverError> {
        self.send_ack(&Command::BlackOut)
    }

    /// 启动主站（约 4s 后返回）
    pub fn start_master_station(&mut self) -> Result<(), DriverError> {
        self.send_ack(&Command::StartMaster)
    }

    /// 关闭主站（约 2s 后返回）
    pub fn stop_master_station(&mut self) -> Result<(), DriverError> {
        self.send_ack(&Command::CloseMaster)
    }

    pub fn enable_servo(&mut self) -> Result<(), DriverError> {
        self.send_ack(&Command::GrpPowerOn)
    }

    pub fn disable_servo(&mut self) -> Result<(), DriverError> {
        self.send_ack(&Command::GrpPowerOff)
    }

    /// 停止当前运动
    pub fn stop_robot(&mut self) -> Result<(), DriverError> {
        self.send_ack(&Command::GrpStop)
    }

    /// 设置速度比例（0.01-1.0）
    pub fn set_speed_ratio(&mut self, ratio: f64) -> Result<(), DriverError> {
        if !(MIN_SPEED_RATIO..=MAX_SPEED_RATIO).contains(&ratio) {
            return Err(DriverError::InvalidArgument(format!(
                "speed ratio {} outside [{}, {}]",
                ratio, MIN_SPEED_RATIO, MAX_SPEED_RATIO
            )));
        }
        self.send_ack(&Command::SetOverride { ratio })
    }

    /// 读取当前位姿 `(x, y, z, rx, ry, rz)`
    ///
    /// 控制器完整回复先给出 6 个关节角，再给出笛卡尔位姿；恰好 6 个值时直接视为位姿。
    /// 其它长度（截断的回复）视为协议错误，不会把关节角当作位姿返回。
    pub fn get_coordinates(&mut self) -> Result<Pose6, DriverError> {
        let values = self.send_numeric(&Command::ReadActPos)?;
        let slice = match values.len() {
            POSE_LEN => &values[..],
            n if n >= POSE_OFFSET_AFTER_JOINTS + POSE_LEN => {
                &values[POSE_OFFSET_AFTER_JOINTS..POSE_OFFSET_AFTER_JOINTS + POSE_LEN]
            },
            n => {
                warn!("ReadActPos returned {} values, expected 6 or at least 12", n);
                return Err(ProtocolError::ShortPayload {
                    expected: POSE_OFFSET_AFTER_JOINTS + POSE_LEN,
                    actual: n,
                }
                .into());
            },
        };
        Ok(Pose6::try_from(slice)?)
    }

    /// 直线运动到绝对位姿
    pub fn move_linear(&mut self, target: &Pose6) -> Result<(), DriverError> {
        ensure_finite("target", target.as_array())?;
        self.send_ack(&Command::MoveL { target: *target })
    }

    /// 沿单轴相对直线运动
    ///
    /// 空间运动存在奇异点，靠近奇异位形时控制器可能拒绝执行。
    pub fn move_linear_relative(
        &mut self,
        axis: Axis,
        direction: Direction,
        distance: f64,
    ) -> Result<(), DriverError> {
        ensure_finite("distance", &[distance])?;
        self.send_ack(&Command::MoveRelL {
            axis,
            direction,
            distance,
        })
    }

    /// 经过途经点的圆弧运动（默认附加参数）
    pub fn move_circular(
        &mut self,
        start: [f64; 3],
        waypoint: [f64; 3],
        target: &Pose6,
    ) -> Result<(), DriverError> {
        self.move_circular_with(start, waypoint, target, CircularMoveParams::default())
    }

    /// 经过途经点的圆弧运动（自定义附加参数）
    pub fn move_circular_with(
        &mut self,
        start: [f64; 3],
        waypoint: [f64; 3],
        target: &Pose6,
        params: CircularMoveParams,
    ) -> Result<(), DriverError> {
        ensure_finite("start", &start)?;
        ensure_finite("waypoint", &waypoint)?;
        ensure_finite("target", target.as_array())?;
        self.send_ack(&Command::MoveC {
            start,
            waypoint,
            target: *target,
            params,
        })
    }

    /// 经过途经点的直线运动
    pub fn move_linear_with_waypoint(
        &mut self,
        waypoint: [f64; 3],
        target: &Pose6,
    ) -> Result<(), DriverError> {
        ensure_finite("waypoint", &waypoint)?;
        ensure_finite("target", target.as_array())?;
        self.send_ack(&Command::MoveB {
            waypoint,
            target: *target,
        })
    }

    /// 读取力/力矩传感器
    pub fn try_read_force_sensor(&mut self) -> Result<ForceTorque, DriverError> {
        let values = self.send_numeric(&Command::ReadForceSensorData)?;
        let slice = values.get(..6).ok_or(ProtocolError::ShortPayload {
            expected: 6,
            actual: values.len(),
        })?;
        let mut array = [0.0; 6];
        array.copy_from_slice(slice);
        Ok(ForceTorque::from_array(array))
    }

    /// 读取力/力矩传感器，失败时返回全零
    ///
    /// 全零与真实的零读数无法区分，需要区分时使用 [`try_read_force_sensor`](Self::try_read_force_sensor)。
    pub fn read_force_sensor(&mut self) -> ForceTorque {
        match self.try_read_force_sensor() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Force sensor read failed, reporting zeros: {}", e);
                ForceTorque::ZERO
            },
        }
    }

    /// 读取运动状态（错误优先于运动）
    pub fn motion_state(&mut self) -> Result<MotionState, DriverError> {
        let values = self.send_numeric(&Command::ReadRobotState)?;
        Ok(MotionState::from_payload(&values)?)
    }

    /// 回原点
    pub fn home_robot(&mut self) -> Result<(), DriverError> {
        self.send_ack(&Command::MoveHoming)
    }

    /// 工具坐标运动开关
    pub fn set_tool_motion(&mut self, enabled: bool) -> Result<(), DriverError> {
        self.send_ack(&Command::SetToolMotion { enabled })
    }
}

fn ensure_finite(name: &str, values: &[f64]) -> Result<(), DriverError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DriverError::InvalidArgument(format!(
            "{} contains non-finite values: {:?}",
            name, values
        )))
    }
}
