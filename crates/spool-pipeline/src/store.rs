//! SQLite 원장 스토어
//!
//! 파일 원장(`processed_files`)과 이벤트 원장(`spool_events`) 두 테이블을 관리합니다.
//! 스키마는 열 때마다 멱등하게 생성되며, 리플레이는 스키마를 건드리지 않는
//! 읽기 전용 연결을 사용합니다.
//!
//! 시각은 `YYYY-MM-DDTHH:MM:SS.nnnnnnnnnZ` 고정 폭 텍스트로 저장되므로
//! 문자열 비교가 곧 시간 비교입니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};

use crate::error::SpoolPipelineError;
use crate::models::{FileMeta, ProcessedFile, SpoolEvent};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS processed_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    mod_unix_nano INTEGER NOT NULL DEFAULT 0,
    processed_at TEXT NOT NULL,
    all_sent INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    deleted_at TEXT,
    last_error TEXT NOT NULL DEFAULT ''
);

CREATE UNIQUE INDEX IF NOT EXISTS uniq_path_sha ON processed_files(path, sha256);
CREATE INDEX IF NOT EXISTS idx_files_processed_at ON processed_files(processed_at);
CREATE INDEX IF NOT EXISTS idx_files_status ON processed_files(all_sent, deleted);

CREATE TABLE IF NOT EXISTS spool_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ingested_at TEXT NOT NULL,
    source_path TEXT NOT NULL,
    source_type TEXT NOT NULL DEFAULT '',
    alert_type TEXT NOT NULL DEFAULT '',
    alert_level TEXT NOT NULL DEFAULT '',
    tag TEXT NOT NULL DEFAULT 'none',
    event_index INTEGER NOT NULL DEFAULT 0,
    file_sha256 TEXT NOT NULL,
    raw_content TEXT NOT NULL DEFAULT '',
    event_json TEXT NOT NULL DEFAULT '{}',
    flat_json TEXT NOT NULL DEFAULT '{}',
    normalized TEXT NOT NULL DEFAULT '',
    content_hash TEXT NOT NULL DEFAULT '',
    sent INTEGER NOT NULL DEFAULT 0,
    send_error TEXT NOT NULL DEFAULT '',
    sent_at TEXT,
    archived_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_file ON spool_events(source_path, file_sha256);
CREATE INDEX IF NOT EXISTS idx_events_sent ON spool_events(sent);
CREATE INDEX IF NOT EXISTS idx_events_archived_at ON spool_events(archived_at);
CREATE INDEX IF NOT EXISTS idx_events_content_hash ON spool_events(content_hash);
"#;

const FILE_COLUMNS: &str = "id, path, sha256, size_bytes, mod_unix_nano, processed_at, \
     all_sent, deleted, deleted_at, last_error";

const EVENT_COLUMNS: &str = "id, ingested_at, source_path, source_type, alert_type, \
     alert_level, tag, event_index, file_sha256, raw_content, event_json, flat_json, \
     normalized, content_hash, sent, send_error, sent_at, archived_at";

/// 원장 스토어
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

impl Store {
    /// 스토어를 열거나 생성하고 스키마를 적용합니다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SpoolPipelineError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// 기존 스토어를 읽기 전용으로 엽니다 (스키마 변경 없음).
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self, SpoolPipelineError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// 스토어 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// (path, sha256) 파일 행이 이미 있는지 확인합니다.
    pub fn is_processed(&self, path: &str, sha256: &str) -> Result<bool, SpoolPipelineError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM processed_files WHERE path = ?1 AND sha256 = ?2",
                params![path, sha256],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 파일의 이벤트와 파일 행을 하나의 트랜잭션으로 기록합니다.
    ///
    /// 성공하면 각 이벤트의 `id`가 채워지고 파일 행 ID를 반환합니다.
    /// 실패하면 어떤 행도 남지 않습니다.
    pub fn archive_file(
        &mut self,
        file: &FileMeta,
        all_sent: bool,
        events: &mut [SpoolEvent],
    ) -> Result<i64, SpoolPipelineError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO spool_events (ingested_at, source_path, source_type, alert_type, \
                 alert_level, tag, event_index, file_sha256, raw_content, event_json, flat_json, \
                 normalized, content_hash, sent, send_error, sent_at, archived_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            for ev in events.iter_mut() {
                stmt.execute(params![
                    to_db_time(&ev.ingested_at),
                    ev.source_path,
                    ev.source_type,
                    ev.alert_type,
                    ev.alert_level,
                    ev.tag,
                    ev.event_index,
                    ev.file_sha256,
                    ev.raw_content,
                    ev.event_json,
                    ev.flat_json,
                    ev.normalized,
                    ev.content_hash,
                    ev.sent,
                    ev.send_error,
                    ev.sent_at.as_ref().map(to_db_time),
                    to_db_time(&ev.archived_at),
                ])?;
                ev.id = tx.last_insert_rowid();
            }
        }

        tx.execute(
            "INSERT INTO processed_files (path, sha256, size_bytes, mod_unix_nano, processed_at, \
             all_sent, deleted, last_error) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, '')",
            params![
                file.path,
                file.sha256,
                file.size_bytes,
                file.mod_unix_nano,
                to_db_time(&Utc::now()),
                all_sent,
            ],
        )?;
        let file_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(file_id)
    }

    /// 파일 행을 제거됨으로 표시하고 메모를 남깁니다.
    pub fn mark_file_deleted(
        &self,
        path: &str,
        sha256: &str,
        note: &str,
    ) -> Result<(), SpoolPipelineError> {
        self.conn.execute(
            "UPDATE processed_files SET deleted = 1, deleted_at = ?3, last_error = ?4 \
             WHERE path = ?1 AND sha256 = ?2",
            params![path, sha256, to_db_time(&Utc::now()), note],
        )?;
        Ok(())
    }

    /// 파일 행의 마지막 에러만 갱신합니다.
    pub fn record_file_error(
        &self,
        path: &str,
        sha256: &str,
        error: &str,
    ) -> Result<(), SpoolPipelineError> {
        self.conn.execute(
            "UPDATE processed_files SET last_error = ?3 WHERE path = ?1 AND sha256 = ?2",
            params![path, sha256, error],
        )?;
        Ok(())
    }

    /// 파일 행을 전송 완료로 표시하고 에러를 지웁니다.
    pub fn mark_file_all_sent(&self, id: i64) -> Result<(), SpoolPipelineError> {
        self.conn.execute(
            "UPDATE processed_files SET all_sent = 1, last_error = '' WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    /// 아직 전송되지 않은 모든 이벤트 (ID 순)
    pub fn pending_events(&self) -> Result<Vec<SpoolEvent>, SpoolPipelineError> {
        self.query_events("WHERE sent = 0 ORDER BY id ASC", [])
    }

    /// 이벤트를 전송 완료로 표시합니다.
    pub fn mark_event_sent(&self, id: i64, at: DateTime<Utc>) -> Result<(), SpoolPipelineError> {
        self.conn.execute(
            "UPDATE spool_events SET sent = 1, send_error = '', sent_at = ?2 WHERE id = ?1",
            params![id, to_db_time(&at)],
        )?;
        Ok(())
    }

    /// 이벤트 전송 에러만 갱신합니다. `sent_at`은 건드리지 않습니다.
    pub fn record_event_error(&self, id: i64, error: &str) -> Result<(), SpoolPipelineError> {
        self.conn.execute(
            "UPDATE spool_events SET send_error = ?2 WHERE id = ?1",
            params![id, error],
        )?;
        Ok(())
    }

    /// 전송 완료 또는 제거가 끝나지 않은 파일 행
    pub fn unfinished_files(&self) -> Result<Vec<ProcessedFile>, SpoolPipelineError> {
        self.query_files("WHERE all_sent = 0 OR deleted = 0 ORDER BY id ASC")
    }

    /// 파일 하나에 속한 (전체, 전송 완료) 이벤트 수
    pub fn count_events_for_file(
        &self,
        path: &str,
        sha256: &str,
    ) -> Result<(i64, i64), SpoolPipelineError> {
        let counts = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(sent), 0) FROM spool_events \
             WHERE source_path = ?1 AND file_sha256 = ?2",
            params![path, sha256],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }

    /// `from` 이후 아카이브된 이벤트 (ID 순)
    pub fn events_archived_since(
        &self,
        from: DateTime<Utc>,
    ) -> Result<Vec<SpoolEvent>, SpoolPipelineError> {
        self.query_events(
            "WHERE archived_at >= ?1 ORDER BY id ASC",
            params![to_db_time(&from)],
        )
    }

    /// 모든 파일 행 (ID 순)
    pub fn list_files(&self) -> Result<Vec<ProcessedFile>, SpoolPipelineError> {
        self.query_files("ORDER BY id ASC")
    }

    /// 모든 이벤트 행 (ID 순)
    pub fn list_events(&self) -> Result<Vec<SpoolEvent>, SpoolPipelineError> {
        self.query_events("ORDER BY id ASC", [])
    }

    fn query_files(&self, clause: &str) -> Result<Vec<ProcessedFile>, SpoolPipelineError> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM processed_files {clause}");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], file_from_row)?;
        let files = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(files)
    }

    fn query_events(
        &self,
        clause: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<SpoolEvent>, SpoolPipelineError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM spool_events {clause}");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, event_from_row)?;
        let events = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<ProcessedFile> {
    Ok(ProcessedFile {
        id: row.get(0)?,
        path: row.get(1)?,
        sha256: row.get(2)?,
        size_bytes: row.get(3)?,
        mod_unix_nano: row.get(4)?,
        processed_at: time_at(row, 5)?,
        all_sent: row.get(6)?,
        deleted: row.get(7)?,
        deleted_at: optional_time_at(row, 8)?,
        last_error: row.get(9)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<SpoolEvent> {
    Ok(SpoolEvent {
        id: row.get(0)?,
        ingested_at: time_at(row, 1)?,
        source_path: row.get(2)?,
        source_type: row.get(3)?,
        alert_type: row.get(4)?,
        alert_level: row.get(5)?,
        tag: row.get(6)?,
        event_index: row.get(7)?,
        file_sha256: row.get(8)?,
        raw_content: row.get(9)?,
        event_json: row.get(10)?,
        flat_json: row.get(11)?,
        normalized: row.get(12)?,
        content_hash: row.get(13)?,
        sent: row.get(14)?,
        send_error: row.get(15)?,
        sent_at: optional_time_at(row, 16)?,
        archived_at: time_at(row, 17)?,
    })
}

/// 고정 폭 UTC 텍스트 (나노초 9자리)
pub fn to_db_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_db_time(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_db_time(idx, &text)
}

fn optional_time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| parse_db_time(idx, &t)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta(path: &str, sha: &str) -> FileMeta {
        FileMeta {
            path: path.to_owned(),
            sha256: sha.to_owned(),
            size_bytes: 10,
            mod_unix_nano: 1,
        }
    }

    fn event(path: &str, sha: &str, idx: i64, sent: bool) -> SpoolEvent {
        let now = Utc::now();
        SpoolEvent {
            ingested_at: now,
            source_path: path.to_owned(),
            source_type: "warn".to_owned(),
            alert_type: "dev".to_owned(),
            alert_level: "warning".to_owned(),
            tag: "none".to_owned(),
            event_index: idx,
            file_sha256: sha.to_owned(),
            event_json: "{\"a\":1}".to_owned(),
            flat_json: "{\"a\":1}".to_owned(),
            sent,
            sent_at: sent.then_some(now),
            send_error: if sent { String::new() } else { "refused".to_owned() },
            archived_at: now,
            ..Default::default()
        }
    }

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("spool.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_uses_wal_journal() {
        let (_dir, store) = temp_store();
        let mode: String = store
            .conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spool.db");
        drop(Store::open(&path).unwrap());
        let store = Store::open(&path).unwrap();
        assert!(store.list_files().unwrap().is_empty());
    }

    #[test]
    fn archive_assigns_ids_and_marks_processed() {
        let (_dir, mut store) = temp_store();
        let mut events = vec![event("/a.warn", "s1", 0, true), event("/a.warn", "s1", 1, false)];
        store
            .archive_file(&meta("/a.warn", "s1"), false, &mut events)
            .unwrap();

        assert!(events[0].id > 0);
        assert!(events[1].id > events[0].id);
        assert!(store.is_processed("/a.warn", "s1").unwrap());
        assert!(!store.is_processed("/a.warn", "other").unwrap());
        assert_eq!(store.count_events_for_file("/a.warn", "s1").unwrap(), (2, 1));

        let stored = store.list_events().unwrap();
        assert_eq!(stored[0].event_json, "{\"a\":1}");
        assert_eq!(stored[1].send_error, "refused");
        assert!(stored[1].sent_at.is_none());
    }

    #[test]
    fn duplicate_file_rolls_back_whole_transaction() {
        let (_dir, mut store) = temp_store();
        let mut first = vec![event("/a.warn", "s1", 0, true)];
        store.archive_file(&meta("/a.warn", "s1"), true, &mut first).unwrap();

        let mut second = vec![event("/a.warn", "s1", 0, true)];
        let err = store.archive_file(&meta("/a.warn", "s1"), true, &mut second);
        assert!(err.is_err());
        // 두 번째 트랜잭션의 이벤트는 남지 않아야 합니다.
        assert_eq!(store.list_events().unwrap().len(), 1);
        assert_eq!(store.list_files().unwrap().len(), 1);
    }

    #[test]
    fn pending_and_resend_bookkeeping() {
        let (_dir, mut store) = temp_store();
        let mut events = vec![event("/a.warn", "s1", 0, false)];
        store.archive_file(&meta("/a.warn", "s1"), false, &mut events).unwrap();

        let pending = store.pending_events().unwrap();
        assert_eq!(pending.len(), 1);

        store.record_event_error(pending[0].id, "still down").unwrap();
        let again = store.pending_events().unwrap();
        assert_eq!(again[0].send_error, "still down");
        assert!(again[0].sent_at.is_none());

        let at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        store.mark_event_sent(pending[0].id, at).unwrap();
        assert!(store.pending_events().unwrap().is_empty());
        let ev = &store.list_events().unwrap()[0];
        assert!(ev.sent);
        assert!(ev.send_error.is_empty());
        assert_eq!(ev.sent_at, Some(at));
    }

    #[test]
    fn file_status_updates() {
        let (_dir, mut store) = temp_store();
        let mut events = vec![event("/a.warn", "s1", 0, true)];
        let id = store.archive_file(&meta("/a.warn", "s1"), false, &mut events).unwrap();
        assert_eq!(store.unfinished_files().unwrap().len(), 1);

        store.record_file_error("/a.warn", "s1", "delete failed: busy").unwrap();
        store.mark_file_all_sent(id).unwrap();
        let f = &store.list_files().unwrap()[0];
        assert!(f.all_sent);
        assert!(f.last_error.is_empty());

        store.mark_file_deleted("/a.warn", "s1", "file missing").unwrap();
        let f = &store.list_files().unwrap()[0];
        assert!(f.deleted);
        assert!(f.deleted_at.is_some());
        assert_eq!(f.last_error, "file missing");
        assert!(store.unfinished_files().unwrap().is_empty());
    }

    #[test]
    fn archived_since_filters_by_time() {
        let (_dir, mut store) = temp_store();
        let mut old = event("/old.warn", "s0", 0, true);
        old.archived_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut new = event("/new.warn", "s1", 0, true);
        new.archived_at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        store.archive_file(&meta("/old.warn", "s0"), true, &mut [old]).unwrap();
        store.archive_file(&meta("/new.warn", "s1"), true, &mut [new]).unwrap();

        let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let found = store.events_archived_since(from).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_path, "/new.warn");
    }

    #[test]
    fn read_only_store_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spool.db");
        drop(Store::open(&path).unwrap());

        let ro = Store::open_read_only(&path).unwrap();
        assert!(ro.list_events().unwrap().is_empty());
        assert!(ro.mark_file_deleted("/a", "s", "x").is_err());
    }

    #[test]
    fn db_time_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_db_time(&a), "2024-01-01T00:00:00.000000000Z");
    }
}
