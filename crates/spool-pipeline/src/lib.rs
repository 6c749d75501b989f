#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`normalize`]: 타임스탬프 제거 정규화와 콘텐츠 지문
//! - [`tag`]: 설정된 코드 중 첫 일치 태그
//! - [`flatten`]: 중첩 JSON을 점 표기 키의 평면 맵으로 변환
//! - [`structured_data`]: RFC 5424 구조화 데이터 인코딩
//! - [`sender`]: syslog 전송 trait과 TCP 구현
//! - [`store`]: 파일/이벤트 원장 (SQLite)
//! - [`models`]: 원장 행 타입
//! - [`rotation`]: 월별 스토어 파일 규칙
//! - [`finder`]: `**` 지원 입력 파일 탐색
//! - [`event`]: 알림 파일 → 이벤트 변환
//! - [`relocate`]: 에러 디렉토리 이동
//! - [`deadline`]: 사이클 마감과 전송 타임아웃
//! - [`stats`]: 사이클 통계와 하트비트
//! - [`runner`]: 사이클 오케스트레이션
//! - [`config`]: 러너 설정
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! Finder -> EventBuilder -> Sender -> Store(tx) -> delete/relocate
//!                             ^
//!                Store(pending) -> resend -> finalize -> heartbeat
//! ```

pub mod config;
pub mod deadline;
pub mod error;
pub mod event;
pub mod finder;
pub mod flatten;
pub mod models;
pub mod normalize;
pub mod relocate;
pub mod rotation;
pub mod runner;
pub mod sender;
pub mod stats;
pub mod store;
pub mod structured_data;
pub mod tag;

// --- 주요 타입 re-export ---

// 러너
pub use runner::Runner;

// 설정
pub use config::{InputSpec, RunnerConfig, RunnerConfigBuilder};

// 에러
pub use error::SpoolPipelineError;

// 전송
pub use sender::{SyslogSender, TcpSyslogSender};

// 원장
pub use models::{FileMeta, ProcessedFile, SpoolEvent};
pub use store::Store;

// 통계
pub use stats::{Heartbeat, RunStats};
