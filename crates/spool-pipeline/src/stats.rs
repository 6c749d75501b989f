//! 사이클 통계와 하트비트 페이로드
//!
//! [`RunStats`]는 사이클마다 새로 만들어져 각 단계에 `&mut`로 전달되고,
//! 사이클 끝에서 한 번 하트비트 JSON으로 렌더링됩니다.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// 한 사이클의 집계 카운터
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// 파일 원장에 새로 기록된 파일 수
    pub files_ingested: u64,
    /// 새로 만들어진 이벤트 수
    pub events_new: u64,
    /// 전송 성공 (신규 + 재전송)
    pub events_sent_ok: u64,
    /// 전송 실패 (신규 + 재전송)
    pub events_sent_err: u64,
    /// 리플레이 성공
    pub events_replay_ok: u64,
    /// 리플레이 실패
    pub events_replay_err: u64,
    /// 삭제 또는 이동된 원본 파일 수
    pub files_deleted: u64,
    /// 관측된 최대 이벤트 지연
    #[serde(skip)]
    pub max_lag: Duration,
}

impl RunStats {
    /// 지연 관측값을 반영합니다.
    pub fn observe_lag(&mut self, lag: Option<Duration>) {
        if let Some(lag) = lag {
            self.max_lag = self.max_lag.max(lag);
        }
    }
}

/// 하트비트 메시지 본문
#[derive(Debug, Clone, Serialize)]
pub struct Heartbeat<'a> {
    /// 하트비트 토큰
    pub deadman: &'a str,
    /// `ok` 또는 `error`
    pub status: &'static str,
    /// 사이클 에러 메시지 (성공 시 빈 문자열)
    pub error: String,
    /// 사이클 시작 시각
    pub started_at: String,
    /// 사이클 종료 시각
    pub ended_at: String,
    /// 소요 시간 (ms)
    pub duration_ms: i64,
    /// 집계 카운터
    #[serde(flatten)]
    pub stats: RunStats,
    /// 최대 지연 (ms)
    pub max_lag_ms: u64,
}

impl<'a> Heartbeat<'a> {
    /// 사이클 결과로 하트비트를 만듭니다.
    pub fn new(
        deadman: &'a str,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        stats: RunStats,
        error: Option<&str>,
    ) -> Self {
        Self {
            deadman,
            status: if error.is_some() { "error" } else { "ok" },
            error: error.unwrap_or_default().to_owned(),
            started_at: started_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ended_at: ended_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            duration_ms: (ended_at - started_at).num_milliseconds(),
            stats,
            max_lag_ms: u64::try_from(stats.max_lag.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
