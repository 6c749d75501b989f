//! 도메인 타입 — 알림 파일과 이벤트를 분류하는 공통 타입
//!
//! 알림 레벨과 소스 유형은 구조화 데이터 레이블과 이벤트 원장에
//! 문자열로 기록되므로, 문자열 표현이 곧 와이어 포맷입니다.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// 알림 레벨
///
/// 디코딩된 객체의 `status` / `level` / `severity` 필드에서 결정되며,
/// 해당 필드가 없으면 파일 확장자에서 기본값을 가져옵니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// 경고
    Warning,
    /// 치명
    Critical,
    /// 알 수 없음
    Unknown,
}

impl AlertLevel {
    /// 원장/레이블에 기록되는 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }

    /// 상태 문자열을 알림 레벨로 정규화합니다.
    ///
    /// - `warn`, `warning`, `1` → `Warning`
    /// - `error`, `critical`, `2`..`5` → `Critical`
    /// - 그 외 → `Unknown`
    pub fn from_status(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "error" | "critical" | "2" | "3" | "4" | "5" => Self::Critical,
            "warn" | "warning" | "1" => Self::Warning,
            _ => Self::Unknown,
        }
    }

    /// 파일 확장자에서 기본 알림 레벨을 결정합니다.
    pub fn from_extension(path: &Path) -> Self {
        match extension_lowercase(path).as_str() {
            "warn" => Self::Warning,
            "alarm" => Self::Critical,
            _ => Self::Unknown,
        }
    }

    /// 원장에 저장된 문자열을 되돌립니다. 빈 값은 `Unknown`입니다.
    pub fn parse_stored(value: &str) -> Self {
        match value.trim() {
            "warning" => Self::Warning,
            "critical" => Self::Critical,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 소스 유형 (파일 확장자 분류)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// `.warn` 파일
    Warn,
    /// `.alarm` 파일
    Alarm,
    /// 그 외 확장자 (점 없이 소문자)
    Other(String),
}

impl SourceType {
    /// 경로의 확장자로 소스 유형을 결정합니다.
    pub fn from_path(path: &Path) -> Self {
        match extension_lowercase(path).as_str() {
            "warn" => Self::Warn,
            "alarm" => Self::Alarm,
            other => Self::Other(other.to_owned()),
        }
    }

    /// 원장에 기록되는 문자열 표현
    pub fn as_str(&self) -> &str {
        match self {
            Self::Warn => "warn",
            Self::Alarm => "alarm",
            Self::Other(ext) => ext,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}
