//! RobotClient 协议测试
//!
//! 使用脚本化的 mock 传输验证命令编码与回复解码。

use neurobot_driver::{
    BufferedForceSensor, ClientConfig, DriverError, ForceSensorConfig, LinkError, RobotClient,
    StabilityCriteria, Transport,
};
use neurobot_protocol::{Axis, Direction, ForceTorque, MotionState, Pose6, ProtocolError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 预设回复队列的 mock 传输
struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Result<Vec<u8>, LinkError>>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl Transport for ScriptedTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.sent
            .lock()
            .unwrap()
            .push(String::from_utf8(bytes.to_vec()).unwrap());
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            },
            Some(Err(e)) => Err(e),
            None => Err(LinkError::Timeout),
        }
    }
}

struct Harness {
    client: RobotClient<ScriptedTransport>,
    replies: Arc<Mutex<VecDeque<Result<Vec<u8>, LinkError>>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    fn new() -> Self {
        let replies = Arc::new(Mutex::new(VecDeque::new()));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = ScriptedTransport {
            replies: replies.clone(),
            sent: sent.clone(),
        };
        Self {
            client: RobotClient::with_transport(ClientConfig::default(), transport),
            replies,
            sent,
        }
    }

    fn reply(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(text.as_bytes().to_vec()));
    }

    fn fail_next(&self, error: LinkError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    fn last_sent(&self) -> String {
        self.sent.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[test]
fn test_get_coordinates_short_reply() {
    let mut h = Harness::new();
    h.reply("1,OK,10.0,20.0,30.0,0,0,0");

    let pose = h.client.get_coordinates().unwrap();
    assert_eq!(h.last_sent(), "ReadActPos,0,;");
    assert_eq!(pose.translation(), [10.0, 20.0, 30.0]);
    assert_eq!(pose.rotation(), [0.0, 0.0, 0.0]);
}

#[test]
fn test_get_coordinates_skips_joint_angles() {
    let mut h = Harness::new();
    h.reply("ReadActPos,OK,1,2,3,4,5,6,100.5,-20,300,180,0,90,0,0,0,0,0,0,;");

    let pose = h.client.get_coordinates().unwrap();
    assert_eq!(pose, Pose6::new(100.5, -20.0, 300.0, 180.0, 0.0, 90.0));
}

#[test]
fn test_get_coordinates_truncated_reply_is_error() {
    let mut h = Harness::new();
    // 关节角之后只有 4 个值：不能把关节角当作位姿
    h.reply("ReadActPos,OK,11,12,13,14,15,16,100,200,300,40,;");

    match h.client.get_coordinates() {
        Err(DriverError::Protocol(ProtocolError::ShortPayload { expected, actual })) => {
            assert_eq!(expected, 12);
            assert_eq!(actual, 10);
        },
        other => panic!("expected ShortPayload, got {:?}", other),
    }
    assert!(h.client.is_connected());

    h.reply("ReadActPos,OK,1,2,3,4,5,;");
    assert!(h.client.get_coordinates().is_err());
}

#[test]
fn test_fail_reply_returns_error_not_panic() {
    let mut h = Harness::new();
    h.reply("1,Fail,ERR3");

    match h.client.get_coordinates() {
        Err(DriverError::CommandFailed { command, code }) => {
            assert_eq!(command, "1");
            assert_eq!(code, "ERR3");
        },
        other => panic!("expected CommandFailed, got {:?}", other),
    }
    // 协议失败不影响连接
    assert!(h.client.is_connected());
}

#[test]
fn test_unknown_status_is_failure() {
    let mut h = Harness::new();
    h.reply("GrpStop,Pending,;");

    assert!(matches!(
        h.client.stop_robot(),
        Err(DriverError::UnexpectedStatus { .. })
    ));
}

#[test]
fn test_timeout_disconnects_without_retry() {
    let mut h = Harness::new();
    h.fail_next(LinkError::Timeout);

    let result = h.client.stop_robot();
    assert!(matches!(result, Err(DriverError::Link(LinkError::Timeout))));
    assert!(!h.client.is_connected());
    // 只发送了一次
    assert_eq!(h.sent.lock().unwrap().len(), 1);

    // 后续调用直接报告未连接
    assert!(matches!(h.client.stop_robot(), Err(DriverError::NotConnected)));
}

#[test]
fn test_malformed_reply() {
    let mut h = Harness::new();
    h.reply("garbage");

    assert!(matches!(
        h.client.enable_servo(),
        Err(DriverError::Protocol(_))
    ));
}

#[test]
fn test_simple_acknowledged_commands() {
    let mut h = Harness::new();
    let cases: Vec<(&str, fn(&mut RobotClient<ScriptedTransport>) -> Result<(), DriverError>)> = vec![
        ("Electrify,;", |c| c.power_up()),
        ("BlackOut,;", |c| c.power_outage()),
        ("StartMaster,;", |c| c.start_master_station()),
        ("CloseMaster,;", |c| c.stop_master_station()),
        ("GrpPowerOn,0,;", |c| c.enable_servo()),
        ("GrpPowerOff,0,;", |c| c.disable_servo()),
        ("GrpStop,0,;", |c| c.stop_robot()),
        ("MoveHoming,0,;", |c| c.home_robot()),
    ];

    for (expected, op) in cases {
        h.reply("X,OK,;");
        op(&mut h.client).unwrap();
        assert_eq!(h.last_sent(), expected);
    }
}

#[test]
fn test_motion_commands_encoding() {
    let mut h = Harness::new();

    h.reply("MoveL,OK,;");
    h.client
        .move_linear(&Pose6::new(1.0, 2.0, 3.0, 180.0, 0.0, 90.0))
        .unwrap();
    assert_eq!(h.last_sent(), "MoveL,0,1,2,3,180,0,90,;");

    h.reply("MoveRelL,OK,;");
    h.client
        .move_linear_relative(Axis::Z, Direction::Positive, 10.0)
        .unwrap();
    assert_eq!(h.last_sent(), "MoveRelL,0,2,1,10,;");

    h.reply("MoveB,OK,;");
    h.client
        .move_linear_with_waypoint([1.0, 1.0, 1.0], &Pose6::new(2.0, 2.0, 2.0, 0.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(h.last_sent(), "MoveB,0,1,1,1,2,2,2,0,0,0,;");

    h.reply("MoveC,OK,;");
    h.client
        .move_circular(
            [0.0, 0.0, 0.0],
            [5.0, 5.0, 0.0],
            &Pose6::new(10.0, 0.0, 0.0, 0.0, 0.0, 0.0),
        )
        .unwrap();
    assert_eq!(
        h.last_sent(),
        "MoveC,0,0,0,0,5,5,0,10,0,0,0,0,0,0,0,1,10,10,1,TCP,Base,0,;"
    );

    h.reply("SetOverride,OK,;");
    h.client.set_speed_ratio(0.5).unwrap();
    assert_eq!(h.last_sent(), "SetOverride,0,0.5,;");

    h.reply("SetToolMotion,OK,;");
    h.client.set_tool_motion(true).unwrap();
    assert_eq!(h.last_sent(), "SetToolMotion,0,1,;");
}

#[test]
fn test_read_force_sensor() {
    let mut h = Harness::new();
    h.reply("ReadForceSensorData,OK,1.5,-2,3,0.1,0.2,0.3,;");

    let reading = h.client.read_force_sensor();
    assert_eq!(
        reading,
        ForceTorque::from_array([1.5, -2.0, 3.0, 0.1, 0.2, 0.3])
    );
}

#[test]
fn test_read_force_sensor_zero_on_failure() {
    let mut h = Harness::new();
    h.reply("ReadForceSensorData,Fail,40010,;");
    assert_eq!(h.client.read_force_sensor(), ForceTorque::ZERO);

    h.reply("ReadForceSensorData,Fail,40010,;");
    assert!(h.client.try_read_force_sensor().is_err());
}

#[test]
fn test_buffered_force_sensor_reads_through_client() {
    let mut h = Harness::new();
    let mut sensor = BufferedForceSensor::new(ForceSensorConfig {
        enabled: true,
        buffer_size: 20,
    });

    for _ in 0..15 {
        h.reply("ReadForceSensorData,OK,0.5,0,-4,0,0,0,;");
        let stored = sensor.update(&mut h.client).unwrap();
        assert_eq!(stored.force, [0.5, 0.0, 4.0]);
    }
    assert_eq!(h.last_sent(), "ReadForceSensorData,;");
    assert!(sensor.is_force_near_setpoint(4.0, 1.5));
    assert!(sensor.is_force_z_stable(4.0, 2.0, &StabilityCriteria::default()));

    // 读取失败不写入缓冲
    h.reply("ReadForceSensorData,Fail,40010,;");
    assert!(sensor.update(&mut h.client).is_err());
    assert_eq!(sensor.len(), 15);
}

#[test]
fn test_disabled_force_sensor_sends_nothing() {
    let mut h = Harness::new();
    let mut sensor = BufferedForceSensor::new(ForceSensorConfig::default());

    assert!(matches!(
        sensor.update(&mut h.client),
        Err(DriverError::ForceSensorDisabled)
    ));
    assert!(h.sent.lock().unwrap().is_empty());
    assert!(sensor.is_empty());
}

#[test]
fn test_motion_state() {
    let mut h = Harness::new();

    h.reply("ReadRobotState,OK,0,0,0,0,0,0,;");
    assert_eq!(h.client.motion_state().unwrap(), MotionState::FreeToMove);
    assert_eq!(h.last_sent(), "ReadRobotState,0,;");

    h.reply("ReadRobotState,OK,1,0,0,0,0,0,;");
    assert_eq!(h.client.motion_state().unwrap(), MotionState::InMotion);

    h.reply("ReadRobotState,OK,1,0,1,0,0,0,;");
    assert_eq!(h.client.motion_state().unwrap(), MotionState::Error);
}

#[test]
fn test_disconnect_then_commands_fail() {
    let mut h = Harness::new();
    h.client.disconnect();
    assert!(!h.client.is_connected());
    assert!(matches!(
        h.client.get_coordinates(),
        Err(DriverError::NotConnected)
    ));
    assert!(h.sent.lock().unwrap().is_empty());
}
