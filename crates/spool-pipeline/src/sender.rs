//! syslog 전송 추상화
//!
//! [`SyslogSender`] trait은 "한 줄을 타임아웃 안에 보낸다"는 능력만 노출합니다.
//! 운영 코드는 메시지마다 TCP 연결을 여는 [`TcpSyslogSender`]를 사용하고,
//! 테스트는 호출을 기록하거나 실패를 주입하는 구현을 사용합니다.
//!
//! # 와이어 포맷
//!
//! ```text
//! <134>1 2024-01-15T02:00:00.123Z host alert-spooler - - [cndp job="mhdbs" ...] {"source":...}\n
//! ```
//!
//! PRI 134는 local0.info 고정입니다.

use std::future::Future;
use std::time::Duration;

use alert_spooler_core::config::DEFAULT_APP_NAME;
use alert_spooler_core::error::DeliveryError;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// local0.info
pub const SYSLOG_PRI: u8 = 134;

/// syslog 한 줄 전송
///
/// 구현체는 `timeout` 안에 연결과 쓰기를 모두 마쳐야 합니다.
/// `timeout`이 0이면 타임아웃 없이 전송합니다.
pub trait SyslogSender: Send + Sync {
    /// RFC 5424 레코드 한 줄을 전송합니다.
    fn send(
        &self,
        app_name: &str,
        structured_data: &str,
        message: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// 메시지마다 새 TCP 연결을 사용하는 syslog 클라이언트
#[derive(Debug, Clone)]
pub struct TcpSyslogSender {
    addr: String,
    hostname: String,
}

impl TcpSyslogSender {
    /// 수신 주소로 클라이언트를 생성합니다. 호스트명은 생성 시 한 번 조회합니다.
    pub fn new(addr: impl Into<String>) -> Self {
        let hostname = gethostname::gethostname()
            .into_string()
            .unwrap_or_default();
        Self {
            addr: addr.into(),
            hostname,
        }
    }

    /// 수신 주소
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn write_line(&self, line: &str) -> Result<(), DeliveryError> {
        let mut stream =
            TcpStream::connect(&self.addr)
                .await
                .map_err(|e| DeliveryError::Connect {
                    addr: self.addr.clone(),
                    reason: e.to_string(),
                })?;

        let write_err = |e: std::io::Error| DeliveryError::Write {
            addr: self.addr.clone(),
            reason: e.to_string(),
        };
        stream.write_all(line.as_bytes()).await.map_err(write_err)?;
        stream.flush().await.map_err(write_err)?;
        stream.shutdown().await.map_err(write_err)?;
        Ok(())
    }
}

impl SyslogSender for TcpSyslogSender {
    async fn send(
        &self,
        app_name: &str,
        structured_data: &str,
        message: &str,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        let line = format_line(&self.hostname, app_name, structured_data, message, Utc::now());
        if timeout.is_zero() {
            return self.write_line(&line).await;
        }

        match tokio::time::timeout(timeout, self.write_line(&line)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout {
                addr: self.addr.clone(),
                timeout_ms: timeout.as_millis(),
            }),
        }
    }
}

/// RFC 5424 레코드 한 줄을 만듭니다 (`\n` 포함).
pub fn format_line(
    hostname: &str,
    app_name: &str,
    structured_data: &str,
    message: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let app_name = if app_name.trim().is_empty() {
        DEFAULT_APP_NAME
    } else {
        app_name
    };
    format!(
        "<{SYSLOG_PRI}>1 {} {} {} - - {} {}\n",
        rfc3339_nano(timestamp),
        sanitize_token(hostname),
        sanitize_token(app_name),
        structured_data,
        message.trim()
    )
}

/// RFC 3339 UTC 시각. 소수 초는 끝의 0을 잘라내고, 0이면 생략합니다.
fn rfc3339_nano(timestamp: DateTime<Utc>) -> String {
    let base = timestamp.format("%Y-%m-%dT%H:%M:%S");
    let nanos = timestamp.timestamp_subsec_nanos();
    if nanos == 0 {
        return format!("{base}Z");
    }
    let fraction = format!("{nanos:09}");
    format!("{base}.{}Z", fraction.trim_end_matches('0'))
}

/// HOSTNAME / APP-NAME 토큰 정리: 빈 값은 `-`, 공백은 `_`
fn sanitize_token(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return "-".to_owned();
    }
    value.replace(' ', "_")
}
