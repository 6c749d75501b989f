//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 파이프라인은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았으면 호출은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `alert_spooler_`
//! - 접미어: `_total` (counter), `_seconds` (gauge/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(alert_spooler_core::metrics::FILES_INGESTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 전송 단계 레이블 키 (fresh, resend, replay, heartbeat)
pub const LABEL_STAGE: &str = "stage";

/// 결과 레이블 값
pub const RESULT_SUCCESS: &str = "success";
/// 결과 레이블 값
pub const RESULT_FAILURE: &str = "failure";

// ─── 스풀러 메트릭 ────────────────────────────────────────────────

/// 원장에 새로 기록된 파일 수 (counter)
pub const FILES_INGESTED_TOTAL: &str = "alert_spooler_files_ingested_total";

/// 새로 아카이브된 이벤트 수 (counter)
pub const EVENTS_ARCHIVED_TOTAL: &str = "alert_spooler_events_archived_total";

/// 이벤트 전송 시도 수 (counter, label: stage, result)
pub const EVENTS_SENT_TOTAL: &str = "alert_spooler_events_sent_total";

/// 전송 확인 후 삭제된 원본 파일 수 (counter)
pub const FILES_DELETED_TOTAL: &str = "alert_spooler_files_deleted_total";

/// 에러 디렉토리로 이동된 파일 수 (counter)
pub const FILES_RELOCATED_TOTAL: &str = "alert_spooler_files_relocated_total";

/// 실행된 작업 사이클 수 (counter, label: result)
pub const CYCLES_TOTAL: &str = "alert_spooler_cycles_total";

/// 직전 사이클에서 관측된 최대 이벤트 지연 (gauge, 초)
pub const MAX_LAG_SECONDS: &str = "alert_spooler_max_lag_seconds";

/// 직전 사이클 소요 시간 (gauge, 초)
pub const CYCLE_DURATION_SECONDS: &str = "alert_spooler_cycle_duration_seconds";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        FILES_INGESTED_TOTAL,
        "Alert files recorded in the file ledger"
    );
    describe_counter!(
        EVENTS_ARCHIVED_TOTAL,
        "Events newly archived in the event ledger"
    );
    describe_counter!(
        EVENTS_SENT_TOTAL,
        "Event delivery attempts by stage and result"
    );
    describe_counter!(
        FILES_DELETED_TOTAL,
        "Source files removed after confirmed delivery"
    );
    describe_counter!(
        FILES_RELOCATED_TOTAL,
        "Undecodable source files moved to an error directory"
    );
    describe_counter!(CYCLES_TOTAL, "Completed work cycles by result");
    describe_gauge!(
        MAX_LAG_SECONDS,
        "Largest event-to-now lag observed in the last cycle"
    );
    describe_gauge!(
        CYCLE_DURATION_SECONDS,
        "Wall-clock duration of the last cycle"
    );
}
