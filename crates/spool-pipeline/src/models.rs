//! 원장 행 모델
//!
//! 두 원장 모두 상태 필드(`sent`, `send_error`, `sent_at`, `all_sent`, `deleted`,
//! `deleted_at`, `last_error`)만 갱신되는 추가 전용 테이블입니다.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 파일 원장 행 — (path, sha256) 쌍마다 한 번 기록되는 멱등성 기록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessedFile {
    /// 행 ID
    pub id: i64,
    /// 원본 경로
    pub path: String,
    /// 파일 전체 SHA-256
    pub sha256: String,
    /// 파일 크기
    pub size_bytes: i64,
    /// 수정 시각 (unix nanos)
    pub mod_unix_nano: i64,
    /// 최초 처리 시각
    pub processed_at: DateTime<Utc>,
    /// 모든 이벤트 전송 완료 여부
    pub all_sent: bool,
    /// 원본 파일 제거(삭제 또는 이동) 여부
    pub deleted: bool,
    /// 제거 시각
    pub deleted_at: Option<DateTime<Utc>>,
    /// 마지막 에러 또는 메모
    pub last_error: String,
}

/// 새로 기록할 파일의 메타데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// 원본 경로
    pub path: String,
    /// 파일 전체 SHA-256
    pub sha256: String,
    /// 파일 크기
    pub size_bytes: i64,
    /// 수정 시각 (unix nanos)
    pub mod_unix_nano: i64,
}

/// 이벤트 원장 행
///
/// `id`는 저장 전까지 0입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpoolEvent {
    /// 행 ID
    pub id: i64,
    /// 수집 시각
    pub ingested_at: DateTime<Utc>,
    /// 원본 경로
    pub source_path: String,
    /// 소스 유형 (warn, alarm, 기타 확장자)
    pub source_type: String,
    /// 라우팅 분류 (dev, iec, business, general, unknown)
    pub alert_type: String,
    /// 알림 레벨 (warning, critical, unknown)
    pub alert_level: String,
    /// 매칭된 4문자 코드 또는 `none`
    pub tag: String,
    /// 파일 내 인덱스
    pub event_index: i64,
    /// 원본 파일 SHA-256 (파일 원장 참조)
    pub file_sha256: String,
    /// 원본 파일 전체 내용
    pub raw_content: String,
    /// 이벤트 JSON (정규 재인코딩)
    pub event_json: String,
    /// 평탄화 JSON
    pub flat_json: String,
    /// 정규화된 키 텍스트
    pub normalized: String,
    /// 지문
    pub content_hash: String,
    /// 전송 완료 여부
    pub sent: bool,
    /// 마지막 전송 에러
    pub send_error: String,
    /// 전송 시각
    pub sent_at: Option<DateTime<Utc>>,
    /// 아카이브 시각
    pub archived_at: DateTime<Utc>,
}
