//! 协议常量定义

/// 控制器 TCP 端口
pub const DEFAULT_PORT: u16 = 10003;

/// 请求结束符（每条命令末尾追加）
pub const MESSAGE_TERMINATOR: &str = ",;";

/// 单次回复读取的最大字节数
pub const MAX_REPLY_SIZE: usize = 1024;

/// 默认机器人组 ID（单臂控制器固定为 0）
pub const DEFAULT_ROBOT_ID: u8 = 0;

/// 回复状态：成功
pub const STATUS_OK: &str = "OK";

/// 回复状态：失败
pub const STATUS_FAIL: &str = "Fail";

/// 速度比例下限
pub const MIN_SPEED_RATIO: f64 = 0.01;

/// 速度比例上限
pub const MAX_SPEED_RATIO: f64 = 1.0;
