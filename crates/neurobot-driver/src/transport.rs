//! 传输抽象层
//!
//! `Transport` 把字节发送/接收与协议逻辑解耦，生产环境使用 [`TcpTransport`]，
//! 测试中可以替换为脚本化的 mock。

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// 传输层错误
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("Receive timeout")]
    Timeout,
    #[error("Connection closed by peer")]
    Closed,
    #[error("Cannot resolve address: {0}")]
    Resolve(String),
}

/// 字节流传输
pub trait Transport {
    /// 发送完整报文
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    /// 阻塞读取一次回复，返回读取的字节数
    ///
    /// 超时返回 `LinkError::Timeout`，对端关闭返回 `LinkError::Closed`。
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;

    /// 关闭连接（默认无操作）
    fn close(&mut self) {}
}

/// TCP 传输
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// 建立 TCP 连接
    ///
    /// # 参数
    /// - `connect_timeout`: 单个地址的连接超时
    /// - `receive_timeout`: 读取超时，`None` 表示无限等待
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        receive_timeout: Option<Duration>,
    ) -> Result<Self, LinkError> {
        let addrs: Vec<_> = (host, port)
            .to_socket_addrs()
            .map_err(|e| LinkError::Resolve(format!("{}:{} ({})", host, port, e)))?
            .collect();
        if addrs.is_empty() {
            return Err(LinkError::Resolve(format!("{}:{}", host, port)));
        }

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(receive_timeout)?;
                    stream.set_nodelay(true)?;
                    debug!("TCP connected to {}", addr);
                    return Ok(Self { stream });
                },
                Err(e) => {
                    debug!("TCP connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                },
            }
        }

        Err(last_error
            .map(LinkError::Io)
            .unwrap_or_else(|| LinkError::Resolve(format!("{}:{}", host, port))))
    }

    /// 从已有的流构建（流的超时设置由调用方负责）
    pub fn from_stream(stream: TcpStream) -> Self {
        Self { stream }
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.stream.write_all(bytes)?;
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        match self.stream.read(buf) {
            Ok(0) => Err(LinkError::Closed),
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Err(LinkError::Timeout)
            },
            Err(e) => Err(LinkError::Io(e)),
        }
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_tcp_roundtrip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut buf = [0u8; 64];
            let n = socket.read(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"GrpStop,0,;");
            socket.write_all(b"GrpStop,OK,;").unwrap();
        });

        let mut transport = TcpTransport::connect(
            "127.0.0.1",
            port,
            Duration::from_secs(1),
            Some(Duration::from_secs(1)),
        )
        .unwrap();
        transport.send(b"GrpStop,0,;").unwrap();
        let mut buf = [0u8; 64];
        let n = transport.receive(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"GrpStop,OK,;");

        server.join().unwrap();
    }

    #[test]
    fn test_tcp_receive_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            // 保持连接但不回复
            thread::sleep(Duration::from_millis(300));
            drop(socket);
        });

        let mut transport = TcpTransport::connect(
            "127.0.0.1",
            port,
            Duration::from_secs(1),
            Some(Duration::from_millis(50)),
        )
        .unwrap();
        let mut buf = [0u8; 16];
        assert!(matches!(transport.receive(&mut buf), Err(LinkError::Timeout)));

        server.join().unwrap();
    }

    #[test]
    fn test_from_stream_reports_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            drop(socket);
        });

        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(1)))
            .unwrap();
        let mut transport = TcpTransport::from_stream(stream);
        server.join().unwrap();

        let mut buf = [0u8; 16];
        assert!(matches!(
            transport.receive(&mut buf),
            Err(LinkError::Closed) | Err(LinkError::Io(_))
        ));
    }

    #[test]
    fn test_tcp_connect_refused() {
        // 先绑定再释放，得到一个当前无人监听的端口
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = TcpTransport::connect(
            "127.0.0.1",
            port,
            Duration::from_millis(200),
            None,
        );
        assert!(result.is_err());
    }
}
