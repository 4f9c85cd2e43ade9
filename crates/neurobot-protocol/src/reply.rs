//! 回复解析
//!
//! 回复是逗号分隔的 ASCII 字段：
//!
//! - `field[0]`：回显的命令名
//! - `field[1]`：状态（`OK` / `Fail`，其它一律视为失败）
//! - `field[2..]`：成功时为负载，失败时 `field[2]` 为错误码
//!
//! 控制器会把 `,;` 结束符留在回复末尾，解析时去掉尾部的空字段和 `;` 字段。

use crate::ProtocolError;
use crate::constants::{STATUS_FAIL, STATUS_OK};

/// 回复状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Fail,
    /// 无法识别的状态字段，按失败处理
    Unknown(String),
}

impl ReplyStatus {
    fn parse(token: &str) -> Self {
        match token {
            STATUS_OK => ReplyStatus::Ok,
            STATUS_FAIL => ReplyStatus::Fail,
            other => ReplyStatus::Unknown(other.to_string()),
        }
    }
}

/// 解码后的回复
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    command: String,
    status: ReplyStatus,
    fields: Vec<String>,
}

impl Reply {
    /// 解析回复文本
    ///
    /// # 错误
    /// - `EmptyReply`: 没有任何内容
    /// - `MalformedReply`: 不足两个字段（缺少状态）
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let text = text.trim_matches(|c: char| c == '\r' || c == '\n' || c == '\0');
        if text.trim().is_empty() {
            return Err(ProtocolError::EmptyReply);
        }

        let mut fields: Vec<String> = text.split(',').map(|f| f.trim().to_string()).collect();
        while fields.len() > 2 && fields.last().is_some_and(|f| f.is_empty() || f == ";") {
            fields.pop();
        }

        if fields.len() < 2 {
            return Err(ProtocolError::MalformedReply(text.to_string()));
        }

        let command = fields[0].clone();
        let status = ReplyStatus::parse(&fields[1]);
        Ok(Self {
            command,
            status,
            fields,
        })
    }

    /// 解析原始字节（UTF-8）
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::InvalidEncoding)?;
        Self::parse(text)
    }

    /// 回显的命令名
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn status(&self) -> &ReplyStatus {
        &self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }

    /// 全部字段（已去掉结束符残留）
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// 成功回复的负载字段；失败回复为空
    pub fn payload(&self) -> &[String] {
        match self.status {
            ReplyStatus::Ok => &self.fields[2..],
            _ => &[],
        }
    }

    /// 失败回复的错误码
    pub fn error_code(&self) -> Option<&str> {
        match self.status {
            ReplyStatus::Ok => None,
            _ => self.fields.get(2).map(String::as_str),
        }
    }

    /// 把负载解析为浮点数
    pub fn numeric_payload(&self) -> Result<Vec<f64>, ProtocolError> {
        parse_numbers(self.payload())
    }
}

/// 把文本字段解析为浮点数
///
/// 出错时报告字段下标，便于定位控制器回复中的问题字段。
pub fn parse_numbers<S: AsRef<str>>(fields: &[S]) -> Result<Vec<f64>, ProtocolError> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let field = field.as_ref().trim();
            field.parse::<f64>().map_err(|_| ProtocolError::InvalidNumber {
                index,
                value: field.to_string(),
            })
        })
        .collect()
}
