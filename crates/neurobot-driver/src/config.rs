//! 客户端连接配置

use neurobot_protocol::{DEFAULT_PORT, DEFAULT_ROBOT_ID, MAX_REPLY_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 控制器连接配置
///
/// 接收超时必须大于最慢的硬件操作（上电约 44s），否则正常的慢操作会被误判为断线。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 控制器地址
    pub host: String,
    /// 控制器端口
    pub port: u16,
    /// 机器人组 ID
    pub robot_id: u8,
    /// 连接超时（毫秒）
    pub connect_timeout_ms: u64,
    /// 接收超时（毫秒），0 表示无限等待
    pub receive_timeout_ms: u64,
    /// 单次回复的缓冲区大小（字节）
    pub reply_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "192.168.200.251".to_string(),
            port: DEFAULT_PORT,
            robot_id: DEFAULT_ROBOT_ID,
            connect_timeout_ms: 5_000,
            receive_timeout_ms: 60_000,
            reply_buffer_size: MAX_REPLY_SIZE,
        }
    }
}

impl ClientConfig {
    /// 指定地址，其余使用默认值
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn receive_timeout(&self) -> Option<Duration> {
        match self.receive_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.port, 10003);
        assert_eq!(config.robot_id, 0);
        assert_eq!(config.reply_buffer_size, 1024);
        // 接收超时必须覆盖上电时间
        assert!(config.receive_timeout().unwrap() > Duration::from_secs(44));
    }

    #[test]
    fn test_with_host_keeps_defaults() {
        let config = ClientConfig::with_host("10.0.0.7");
        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(
            config,
            ClientConfig {
                host: "10.0.0.7".to_string(),
                ..ClientConfig::default()
            }
        );
    }

    #[test]
    fn test_zero_receive_timeout_means_blocking() {
        let config = ClientConfig {
            receive_timeout_ms: 0,
            ..ClientConfig::default()
        };
        assert_eq!(config.receive_timeout(), None);
    }

    #[test]
    fn test_partial_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
host = "10.0.0.2"
receive_timeout_ms = 90000
"#,
        )
        .unwrap();
        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.port, 10003);
        assert_eq!(config.receive_timeout(), Some(Duration::from_secs(90)));
    }
}
