//! 스풀 파이프라인 에러 타입
//!
//! [`SpoolPipelineError`]는 수집/아카이브/전송/정리 사이클에서 발생하는 모든 에러를 표현합니다.
//! `From<SpoolPipelineError> for SpoolerError` 변환이 구현되어 있어
//! 데몬에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use alert_spooler_core::error::{ConfigError, DeliveryError, SpoolerError, StorageError};

/// 스풀 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SpoolPipelineError {
    /// 원본 파일 읽기 실패
    #[error("read failed: {path}: {source}")]
    Read {
        /// 파일 경로
        path: String,
        /// 원인
        #[source]
        source: std::io::Error,
    },

    /// 스토어(SQLite) 에러
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// JSON 인코딩 에러
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// glob 패턴 에러
    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// 디렉토리 순회 에러
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// 전송 에러
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// 사이클 전체 타임아웃 초과
    #[error("timeout exceeded")]
    DeadlineExceeded,

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 에러 디렉토리 이동 실패
    #[error("relocate failed: {path}: {reason}")]
    Relocate {
        /// 원본 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 하나 이상의 파일 처리 실패 (첫 번째 에러만 보존)
    #[error("{failed} file(s) failed to ingest, first: {first}")]
    Ingest {
        /// 실패한 파일 수
        failed: usize,
        /// 첫 번째 실패 메시지
        first: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SpoolPipelineError> for SpoolerError {
    fn from(err: SpoolPipelineError) -> Self {
        match err {
            SpoolPipelineError::Store(e) => StorageError::Query(e.to_string()).into(),
            SpoolPipelineError::Delivery(e) => SpoolerError::Delivery(e),
            SpoolPipelineError::Config { field, reason } => {
                ConfigError::InvalidValue { field, reason }.into()
            }
            SpoolPipelineError::Io(e) => SpoolerError::Io(e),
            other => SpoolerError::Pipeline(other.to_string()),
        }
    }
}
