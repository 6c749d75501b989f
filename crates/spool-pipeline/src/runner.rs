//! 러너 -- 한 작업 사이클의 수집/아카이브/전송/정리를 엄격한 순서로 수행합니다.
//!
//! # 사이클 순서
//! ```text
//! 스토어 선택 -> (리플레이 전용 | 수집+아카이브+전송 -> 재전송 -> 정리) -> 하트비트
//! ```
//!
//! 상태는 명시적 enum이 아니라 원장 필드(`sent`, `all_sent`, `deleted`)에 있습니다.
//! 원본 삭제는 항상 원장 커밋 이후에만 일어나고, 재전송은 정리보다 먼저 수행되어
//! 같은 사이클 안에서 삭제 판단에 반영됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use alert_spooler_pipeline::{Runner, RunnerConfig, TcpSyslogSender};
//!
//! let config = RunnerConfig::from_core(&core_config)?;
//! let mut runner = Runner::new(config, TcpSyslogSender::new("127.0.0.1:1514"))?;
//! let stats = runner.run_once().await?;
//! ```

use std::path::Path;
use std::time::{Instant, UNIX_EPOCH};

use alert_spooler_core::metrics as m;
use alert_spooler_core::types::AlertLevel;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::deadline::Deadline;
use crate::error::SpoolPipelineError;
use crate::event::{EventBuilder, FileContext, encode_payload, error_event, stored_event_lag};
use crate::finder::{InputItem, expand_inputs};
use crate::models::{FileMeta, SpoolEvent};
use crate::normalize::sha256_hex;
use crate::relocate::relocate;
use crate::rotation::{list_period_stores, period_key, period_store_path};
use crate::sender::SyslogSender;
use crate::stats::{Heartbeat, RunStats};
use crate::store::Store;
use crate::structured_data::{self, SdParams};
use crate::tag::NO_TAG;

/// 정리 단계에서 원본이 사라졌을 때 남기는 메모
pub const NOTE_FILE_MISSING: &str = "file missing";

/// 정리 단계에서 원본 내용이 바뀌었을 때 남기는 메모
pub const NOTE_FILE_REPLACED: &str = "file replaced";

/// 정적 스토어 모드의 기간 키 자리표시
const STATIC_PERIOD: &str = "static";

/// 전송 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Fresh,
    Resend,
    Replay,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Resend => "resend",
            Self::Replay => "replay",
        }
    }
}

/// 알림 파일 스풀러 러너
///
/// 스토어 연결은 한 기간(월) 동안 러너가 단독으로 소유합니다.
/// 한 스토어/입력에 대해 러너 인스턴스를 동시에 여러 개 실행하면 안 됩니다.
pub struct Runner<S: SyslogSender> {
    config: RunnerConfig,
    sender: S,
    builder: EventBuilder,
    store: Option<Store>,
    period: Option<String>,
    last_stats: RunStats,
}

impl<S: SyslogSender> std::fmt::Debug for Runner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("store", &self.store)
            .field("period", &self.period)
            .field("last_stats", &self.last_stats)
            .finish_non_exhaustive()
    }
}

impl<S: SyslogSender> Runner<S> {
    /// 러너를 생성하고 현재 기간의 스토어를 엽니다.
    pub fn new(config: RunnerConfig, sender: S) -> Result<Self, SpoolPipelineError> {
        let builder = EventBuilder::new(config.hash_hex_len, config.tag_codes.clone())?;
        let mut runner = Self {
            config,
            sender,
            builder,
            store: None,
            period: None,
            last_stats: RunStats::default(),
        };
        runner.ensure_store(Utc::now())?;
        Ok(runner)
    }

    /// 러너 설정
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// 전송기
    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// 현재 열린 스토어
    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    /// 직전 사이클의 통계 (실패한 사이클 포함)
    pub fn last_stats(&self) -> RunStats {
        self.last_stats
    }

    /// 리플레이 시작 시각을 바꿉니다. `None`이면 일반 사이클로 돌아갑니다.
    pub fn set_replay_from(&mut self, from: Option<DateTime<Utc>>) {
        self.config.replay_from = from;
    }

    /// 스토어를 닫습니다. 다음 사이클이 다시 엽니다.
    pub fn close(&mut self) {
        if let Some(store) = self.store.take() {
            debug!(path = %store.path().display(), "store closed");
        }
        self.period = None;
    }

    /// 작업 사이클 하나를 실행합니다.
    ///
    /// 어떤 단계가 실패해도 하트비트는 (설정되어 있으면) 시도됩니다.
    pub async fn run_once(&mut self) -> Result<RunStats, SpoolPipelineError> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let deadline = Deadline::after(self.config.timeout);
        let mut stats = RunStats::default();

        let result = self.run_cycle(&deadline, &mut stats).await;
        let ended_at = Utc::now();

        if let Some(token) = self.config.deadman.clone() {
            let error = result.as_ref().err().map(ToString::to_string);
            self.send_heartbeat(&token, &deadline, started_at, ended_at, stats, error.as_deref())
                .await;
        }

        let outcome = if result.is_ok() {
            m::RESULT_SUCCESS
        } else {
            m::RESULT_FAILURE
        };
        counter!(m::CYCLES_TOTAL, m::LABEL_RESULT => outcome).increment(1);
        gauge!(m::MAX_LAG_SECONDS).set(stats.max_lag.as_secs_f64());
        gauge!(m::CYCLE_DURATION_SECONDS).set(timer.elapsed().as_secs_f64());
        self.last_stats = stats;

        result?;
        info!(
            files_ingested = stats.files_ingested,
            events_new = stats.events_new,
            events_sent_ok = stats.events_sent_ok,
            events_sent_err = stats.events_sent_err,
            events_replay_ok = stats.events_replay_ok,
            events_replay_err = stats.events_replay_err,
            files_deleted = stats.files_deleted,
            max_lag_ms = u64::try_from(stats.max_lag.as_millis()).unwrap_or(u64::MAX),
            "cycle complete"
        );
        Ok(stats)
    }

    async fn run_cycle(
        &mut self,
        deadline: &Deadline,
        stats: &mut RunStats,
    ) -> Result<(), SpoolPipelineError> {
        self.ensure_store(Utc::now())?;

        if let Some(from) = self.config.replay_from {
            return self.replay(from, deadline, stats).await;
        }

        let ingest_failure = self.ingest_all(deadline, stats).await?;
        deadline.check()?;
        self.resend_pending(deadline, stats).await?;
        deadline.check()?;
        self.finalize(stats).await?;

        match ingest_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // ─── 스토어 선택 ────────────────────────────────────────────────

    fn ensure_store(&mut self, now: DateTime<Utc>) -> Result<(), SpoolPipelineError> {
        let Some(folder) = self.config.db_folder.clone() else {
            if self.store.is_none() {
                let store = Store::open(&self.config.db_path)?;
                info!(path = %store.path().display(), "store opened");
                self.store = Some(store);
                self.period = Some(STATIC_PERIOD.to_owned());
            }
            return Ok(());
        };

        let key = period_key(now);
        if self.store.is_some() && self.period.as_deref() == Some(key.as_str()) {
            return Ok(());
        }

        self.close();
        std::fs::create_dir_all(&folder)?;
        let path = period_store_path(&folder, &self.config.db_prefix, &key);
        let store = Store::open(&path)?;
        info!(path = %path.display(), period = %key, "store rotated");
        self.store = Some(store);
        self.period = Some(key);
        Ok(())
    }

    fn active_store(&self) -> Result<&Store, SpoolPipelineError> {
        self.store.as_ref().ok_or_else(store_not_open)
    }

    fn active_store_mut(&mut self) -> Result<&mut Store, SpoolPipelineError> {
        self.store.as_mut().ok_or_else(store_not_open)
    }

    // ─── 리플레이 ──────────────────────────────────────────────────

    async fn replay(
        &mut self,
        from: DateTime<Utc>,
        deadline: &Deadline,
        stats: &mut RunStats,
    ) -> Result<(), SpoolPipelineError> {
        let Some(folder) = self.config.db_folder.as_deref() else {
            return Err(SpoolPipelineError::Config {
                field: "database.folder".to_owned(),
                reason: "replay requires a monthly store folder".to_owned(),
            });
        };

        let paths = list_period_stores(folder, &self.config.db_prefix, from, Utc::now())?;
        if paths.is_empty() {
            info!(folder = %folder.display(), "replay: no stores in range");
            return Ok(());
        }

        for path in paths {
            deadline.check()?;
            let events = Store::open_read_only(&path)?.events_archived_since(from)?;
            debug!(path = %path.display(), events = events.len(), "replay: store scanned");

            for ev in &events {
                deadline.check()?;
                self.observe_stored_lag(ev, stats);
                match self.deliver(ev, Stage::Replay, deadline).await {
                    Ok(()) => stats.events_replay_ok += 1,
                    Err(e) => {
                        debug!(event_id = ev.id, error = %e, "replay send failed");
                        stats.events_replay_err += 1;
                    }
                }
            }
        }

        info!(
            replayed = stats.events_replay_ok,
            failed = stats.events_replay_err,
            "replay complete"
        );
        Ok(())
    }

    // ─── 수집 + 아카이브 + 전송 ──────────────────────────────────────

    /// 모든 입력 파일을 처리합니다. 파일별 실패는 모아서 첫 에러와 개수를 반환합니다.
    async fn ingest_all(
        &mut self,
        deadline: &Deadline,
        stats: &mut RunStats,
    ) -> Result<Option<SpoolPipelineError>, SpoolPipelineError> {
        let items = expand_inputs(&self.config.inputs)?;
        debug!(files = items.len(), "inputs expanded");

        let mut failed = 0usize;
        let mut first = None;
        for item in &items {
            deadline.check()?;
            match self.ingest_file(item, deadline, stats).await {
                Ok(()) => {}
                Err(SpoolPipelineError::DeadlineExceeded) => {
                    return Err(SpoolPipelineError::DeadlineExceeded);
                }
                Err(e) => {
                    warn!(path = %item.path.display(), error = %e, "file ingestion failed");
                    failed += 1;
                    first.get_or_insert_with(|| e.to_string());
                }
            }
        }

        Ok(first.map(|first| SpoolPipelineError::Ingest { failed, first }))
    }

    async fn ingest_file(
        &mut self,
        item: &InputItem,
        deadline: &Deadline,
        stats: &mut RunStats,
    ) -> Result<(), SpoolPipelineError> {
        let path = item.path.as_path();
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "file vanished before read, skipping");
                return Ok(());
            }
            Err(e) => return Err(read_err(path, e)),
        };
        if meta.is_dir() || meta.len() == 0 {
            return Ok(());
        }

        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) => {
                if let Some(dir) = &item.error_dir {
                    match relocate(path, dir).await {
                        Ok(dst) => warn!(path = %path.display(), dst = %dst.display(), "unreadable file moved to error dir"),
                        Err(mv) => warn!(path = %path.display(), error = %mv, "unreadable file could not be moved"),
                    }
                }
                return Err(read_err(path, e));
            }
        };

        let sha256 = sha256_hex(&content);
        let path_text = path.display().to_string();
        if self.active_store()?.is_processed(&path_text, &sha256)? {
            debug!(path = %path_text, "already processed, skipping");
            return Ok(());
        }

        let file = FileMeta {
            path: path_text,
            sha256: sha256.clone(),
            size_bytes: i64::try_from(meta.len()).unwrap_or(i64::MAX),
            mod_unix_nano: meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .and_then(|d| i64::try_from(d.as_nanos()).ok())
                .unwrap_or_default(),
        };
        let raw = String::from_utf8_lossy(&content).into_owned();
        let ctx = FileContext::new(path, item.alert_type.as_deref(), sha256, raw);

        let decoded = serde_json::from_slice::<Value>(&content)
            .map_err(SpoolPipelineError::from)
            .and_then(|value| self.builder.build_all(&value, &ctx));
        let (events, undecodable) = match decoded {
            Ok(events) => (events, false),
            Err(e) => {
                debug!(path = %ctx.path, error = %e, "decode failed, archiving error event");
                (vec![error_event(&ctx, 0, &e.to_string())], true)
            }
        };

        self.archive_and_send(item, &file, events, undecodable, deadline, stats)
            .await
    }

    async fn archive_and_send(
        &mut self,
        item: &InputItem,
        file: &FileMeta,
        mut events: Vec<SpoolEvent>,
        undecodable: bool,
        deadline: &Deadline,
        stats: &mut RunStats,
    ) -> Result<(), SpoolPipelineError> {
        let mut all_sent = true;
        for ev in events.iter_mut() {
            stats.events_new += 1;
            self.observe_stored_lag(ev, stats);
            match self.deliver(ev, Stage::Fresh, deadline).await {
                Ok(()) => {
                    ev.sent = true;
                    ev.sent_at = Some(Utc::now());
                    stats.events_sent_ok += 1;
                }
                Err(e) => {
                    ev.sent = false;
                    ev.send_error = e.to_string();
                    all_sent = false;
                    stats.events_sent_err += 1;
                }
            }
        }

        let error_dir = item.error_dir.as_deref().filter(|_| undecodable);
        if let Err(e) = self.active_store_mut()?.archive_file(file, all_sent, &mut events) {
            if let Some(dir) = error_dir {
                match relocate(&item.path, dir).await {
                    Ok(dst) => warn!(path = %file.path, dst = %dst.display(), "undecodable file moved after failed archive"),
                    Err(mv) => warn!(path = %file.path, error = %mv, "undecodable file could not be moved"),
                }
            }
            return Err(e);
        }

        stats.files_ingested += 1;
        counter!(m::FILES_INGESTED_TOTAL).increment(1);
        counter!(m::EVENTS_ARCHIVED_TOTAL).increment(events.len() as u64);
        debug!(path = %file.path, events = events.len(), all_sent, "file archived");

        if let Some(dir) = error_dir {
            let moved = relocate(&item.path, dir).await;
            let store = self.active_store()?;
            match moved {
                Ok(dst) => {
                    store.mark_file_deleted(
                        &file.path,
                        &file.sha256,
                        &format!("moved to error_dir: {}", dst.display()),
                    )?;
                    stats.files_deleted += 1;
                    counter!(m::FILES_RELOCATED_TOTAL).increment(1);
                    info!(path = %file.path, dst = %dst.display(), "undecodable file moved to error dir");
                }
                Err(e) => {
                    store.record_file_error(
                        &file.path,
                        &file.sha256,
                        &format!("move to error_dir failed: {e}"),
                    )?;
                    warn!(path = %file.path, error = %e, "move to error dir failed");
                }
            }
            return Ok(());
        }

        if self.config.delete_after_send && all_sent && self.delete_source(file).await? {
            stats.files_deleted += 1;
        }
        Ok(())
    }

    /// 원본을 지우고 원장에 반영합니다. 삭제 실패는 원장 에러로만 남습니다.
    async fn delete_source(&self, file: &FileMeta) -> Result<bool, SpoolPipelineError> {
        let removed = tokio::fs::remove_file(&file.path).await;
        let store = self.active_store()?;
        match removed {
            Ok(()) => {
                store.mark_file_deleted(&file.path, &file.sha256, "")?;
                counter!(m::FILES_DELETED_TOTAL).increment(1);
                debug!(path = %file.path, "source file deleted");
                Ok(true)
            }
            Err(e) => {
                store.record_file_error(&file.path, &file.sha256, &format!("delete failed: {e}"))?;
                warn!(path = %file.path, error = %e, "delete failed");
                Ok(false)
            }
        }
    }

    // ─── 재전송 ────────────────────────────────────────────────────

    async fn resend_pending(
        &mut self,
        deadline: &Deadline,
        stats: &mut RunStats,
    ) -> Result<(), SpoolPipelineError> {
        let pending = self.active_store()?.pending_events()?;
        if !pending.is_empty() {
            debug!(pending = pending.len(), "resending pending events");
        }

        for ev in &pending {
            deadline.check()?;
            self.observe_stored_lag(ev, stats);
            match self.deliver(ev, Stage::Resend, deadline).await {
                Ok(()) => {
                    self.active_store()?.mark_event_sent(ev.id, Utc::now())?;
                    stats.events_sent_ok += 1;
                }
                Err(e) => {
                    self.active_store()?.record_event_error(ev.id, &e.to_string())?;
                    stats.events_sent_err += 1;
                }
            }
        }
        Ok(())
    }

    // ─── 정리 ──────────────────────────────────────────────────────

    async fn finalize(&mut self, stats: &mut RunStats) -> Result<(), SpoolPipelineError> {
        let files = self.active_store()?.unfinished_files()?;

        for pf in files {
            let (total, sent) = match self.active_store()?.count_events_for_file(&pf.path, &pf.sha256) {
                Ok(counts) => counts,
                Err(e) => {
                    warn!(path = %pf.path, error = %e, "event count failed");
                    continue;
                }
            };
            if total == 0 {
                continue;
            }

            let fully_sent = sent == total;
            if fully_sent && !pf.all_sent {
                self.active_store()?.mark_file_all_sent(pf.id)?;
            }
            if !(self.config.delete_after_send && fully_sent && !pf.deleted) {
                continue;
            }

            let current = match tokio::fs::read(&pf.path).await {
                Ok(current) => current,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    self.active_store()?
                        .mark_file_deleted(&pf.path, &pf.sha256, NOTE_FILE_MISSING)?;
                    debug!(path = %pf.path, "source already gone");
                    continue;
                }
                Err(e) => {
                    self.active_store()?.record_file_error(
                        &pf.path,
                        &pf.sha256,
                        &format!("read before delete failed: {e}"),
                    )?;
                    warn!(path = %pf.path, error = %e, "read before delete failed");
                    continue;
                }
            };
            if sha256_hex(&current) != pf.sha256 {
                self.active_store()?
                    .mark_file_deleted(&pf.path, &pf.sha256, NOTE_FILE_REPLACED)?;
                info!(path = %pf.path, "source content changed, leaving new content for ingestion");
                continue;
            }

            let meta = FileMeta {
                path: pf.path.clone(),
                sha256: pf.sha256.clone(),
                size_bytes: pf.size_bytes,
                mod_unix_nano: pf.mod_unix_nano,
            };
            if self.delete_source(&meta).await? {
                stats.files_deleted += 1;
            }
        }
        Ok(())
    }

    // ─── 하트비트 ──────────────────────────────────────────────────

    async fn send_heartbeat(
        &self,
        token: &str,
        deadline: &Deadline,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        stats: RunStats,
        error: Option<&str>,
    ) {
        let heartbeat = Heartbeat::new(token, started_at, ended_at, stats, error);
        let message = match serde_json::to_string(&heartbeat) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "heartbeat encode failed");
                return;
            }
        };

        let mut params = self.config.labels.clone();
        for (key, value) in [
            ("filename", "-"),
            ("alert_type", "deadman"),
            ("alert_level", AlertLevel::Unknown.as_str()),
            ("hash", "deadman"),
            ("tag", NO_TAG),
            ("deadman", token),
        ] {
            params.insert(key.to_owned(), value.to_owned());
        }
        let sd = structured_data::encode(&self.config.sd_id, &params);

        let timeout = deadline.send_timeout(self.config.send_timeout);
        match self
            .sender
            .send(&self.config.app_name, &sd, &message, timeout)
            .await
        {
            Ok(()) => debug!(deadman = token, "heartbeat sent"),
            Err(e) => warn!(deadman = token, error = %e, "heartbeat send failed"),
        }
    }

    // ─── 전송 ──────────────────────────────────────────────────────

    async fn deliver(
        &self,
        ev: &SpoolEvent,
        stage: Stage,
        deadline: &Deadline,
    ) -> Result<(), SpoolPipelineError> {
        deadline.check()?;

        let mut params = self.event_params(ev);
        if stage == Stage::Replay {
            params.insert("replay".to_owned(), "true".to_owned());
        }
        let sd = structured_data::encode(&self.config.sd_id, &params);
        let message = encode_payload(ev)?;

        let timeout = deadline.send_timeout(self.config.send_timeout);
        let result = self
            .sender
            .send(&self.config.app_name, &sd, &message, timeout)
            .await;

        let outcome = if result.is_ok() {
            m::RESULT_SUCCESS
        } else {
            m::RESULT_FAILURE
        };
        counter!(m::EVENTS_SENT_TOTAL, m::LABEL_STAGE => stage.as_str(), m::LABEL_RESULT => outcome)
            .increment(1);

        match result {
            Ok(()) => {
                debug!(event_id = ev.id, stage = stage.as_str(), source = %ev.source_path, "event sent");
                Ok(())
            }
            Err(e) => {
                debug!(event_id = ev.id, stage = stage.as_str(), error = %e, "event send failed");
                Err(e.into())
            }
        }
    }

    /// 이벤트의 구조화 데이터 파라미터 (고정 레이블 + 이벤트 필드)
    fn event_params(&self, ev: &SpoolEvent) -> SdParams {
        let level = AlertLevel::parse_stored(&ev.alert_level);
        let filename = Path::new(&ev.source_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut params = self.config.labels.clone();
        params.insert("filename".to_owned(), filename);
        params.insert("alert_type".to_owned(), ev.alert_type.clone());
        params.insert("alert_level".to_owned(), level.as_str().to_owned());
        params.insert("hash".to_owned(), ev.content_hash.clone());
        params.insert("tag".to_owned(), ev.tag.clone());
        params
    }

    fn observe_stored_lag(&self, ev: &SpoolEvent, stats: &mut RunStats) {
        stats.observe_lag(stored_event_lag(
            Utc::now(),
            &ev.event_json,
            &self.config.event_time_offset,
        ));
    }
}

fn store_not_open() -> SpoolPipelineError {
    SpoolPipelineError::Config {
        field: "database".to_owned(),
        reason: "store is not open".to_owned(),
    }
}

fn read_err(path: &Path, source: std::io::Error) -> SpoolPipelineError {
    SpoolPipelineError::Read {
        path: path.display().to_string(),
        source,
    }
}
