//! 에러 타입 — 도메인별 에러 정의

/// alert-spooler 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SpoolerError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스풀 파이프라인(수집/아카이브/전송) 에러
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 전송 에러
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스토리지 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 스토어 열기 실패
    #[error("open failed: {path}: {reason}")]
    Open { path: String, reason: String },

    /// 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),

    /// 트랜잭션 커밋 실패
    #[error("transaction failed: {0}")]
    Transaction(String),
}

/// 전송 에러
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// 연결 실패
    #[error("connect to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    /// 쓰기 실패
    #[error("write to {addr} failed: {reason}")]
    Write { addr: String, reason: String },

    /// 타임아웃
    #[error("send to {addr} timed out after {timeout_ms}ms")]
    Timeout { addr: String, timeout_ms: u128 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: SpoolerError = ConfigError::InvalidValue {
            field: "spooler.job".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert!(matches!(err, SpoolerError::Config(_)));
        assert!(err.to_string().contains("spooler.job"));
    }

    #[test]
    fn delivery_timeout_display() {
        let err = DeliveryError::Timeout {
            addr: "127.0.0.1:1514".to_owned(),
            timeout_ms: 3000,
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:1514"));
        assert!(msg.contains("3000ms"));
    }
}
