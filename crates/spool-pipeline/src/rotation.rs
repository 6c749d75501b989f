//! 월별 스토어 파일 규칙
//!
//! 폴더 모드에서 스토어 파일은 `<folder>/<prefix><YYYYMM>.db`이며 기간 키는 UTC 기준입니다.
//! 리플레이는 같은 이름 규칙을 파싱해 기간 범위 안의 파일을 고릅니다.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use glob::Pattern;
use tracing::debug;

use crate::error::SpoolPipelineError;

/// 시각의 기간 키 (`YYYYMM`, UTC)
pub fn period_key(at: DateTime<Utc>) -> String {
    at.format("%Y%m").to_string()
}

/// 기간 키의 스토어 파일 경로
pub fn period_store_path(folder: &Path, prefix: &str, key: &str) -> PathBuf {
    folder.join(format!("{prefix}{key}.db"))
}

/// 파일 이름에서 기간 키를 꺼냅니다. 규칙에 맞지 않으면 `None`입니다.
pub fn parse_period_key<'a>(file_name: &'a str, prefix: &str) -> Option<&'a str> {
    let key = file_name.strip_prefix(prefix)?.strip_suffix(".db")?;
    if key.len() != 6 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month: u32 = key[4..].parse().ok()?;
    (1..=12).contains(&month).then_some(key)
}

/// `[from, to]` 기간에 속하는 스토어 파일을 기간 순으로 반환합니다.
pub fn list_period_stores(
    folder: &Path,
    prefix: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<PathBuf>, SpoolPipelineError> {
    let from_key = period_key(from);
    let to_key = period_key(to);
    let pattern = format!(
        "{}/{}*.db",
        Pattern::escape(&folder.to_string_lossy()),
        Pattern::escape(prefix)
    );

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                debug!(error = %e, "store entry unreadable, skipping");
                continue;
            }
        };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(key) = parse_period_key(name, prefix) else {
            continue;
        };
        // 고정 폭 키라서 문자열 비교가 기간 비교와 같습니다.
        if key >= from_key.as_str() && key <= to_key.as_str() {
            found.push((key.to_owned(), path.clone()));
        }
    }

    found.sort();
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn period_key_is_utc_year_month() {
        assert_eq!(period_key(at(2024, 1)), "202401");
        let late = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(period_key(late), "202412");
    }

    #[test]
    fn parse_period_key_rejects_foreign_names() {
        assert_eq!(parse_period_key("alerts_202401.db", "alerts_"), Some("202401"));
        assert_eq!(parse_period_key("alerts_202413.db", "alerts_"), None);
        assert_eq!(parse_period_key("alerts_2024.db", "alerts_"), None);
        assert_eq!(parse_period_key("alerts_20240a.db", "alerts_"), None);
        assert_eq!(parse_period_key("other_202401.db", "alerts_"), None);
        assert_eq!(parse_period_key("alerts_202401.db-wal", "alerts_"), None);
    }

    #[test]
    fn lists_only_stores_in_range_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "alerts_202403.db",
            "alerts_202311.db",
            "alerts_202401.db",
            "alerts_202405.db",
            "alerts_junk.db",
            "other_202402.db",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let found = list_period_stores(dir.path(), "alerts_", at(2024, 1), at(2024, 4)).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alerts_202401.db", "alerts_202403.db"]);
    }

    #[test]
    fn prefix_with_glob_characters_is_literal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a[1]_202401.db"), b"").unwrap();
        std::fs::write(dir.path().join("a1_202401.db"), b"").unwrap();

        let found = list_period_stores(dir.path(), "a[1]_", at(2024, 1), at(2024, 1)).unwrap();
        assert_eq!(found, vec![dir.path().join("a[1]_202401.db")]);
    }

    #[test]
    fn store_path_layout() {
        assert_eq!(
            period_store_path(Path::new("/var/lib/spool"), "alerts_", "202401"),
            PathBuf::from("/var/lib/spool/alerts_202401.db")
        );
    }
}
