//! 입력 파일 탐색
//!
//! 일반 패턴은 `glob` 크레이트로 확장합니다. `**` 세그먼트가 있으면 첫 `**` 앞부분을
//! 기준 디렉토리로 삼아 `walkdir`로 순회하고, 나머지 패턴을 상대 경로에 매칭합니다.
//! 나머지 패턴에 `/`가 없으면 파일 이름에만 매칭하므로 `/data/**/*.warn`은
//! 모든 깊이의 `.warn` 파일을 찾습니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::InputSpec;
use crate::error::SpoolPipelineError;

/// 확장된 입력 파일 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    /// 파일 경로
    pub path: PathBuf,
    /// 강제 알림 유형
    pub alert_type: Option<String>,
    /// 에러 디렉토리
    pub error_dir: Option<PathBuf>,
}

/// 모든 입력 스펙을 확장합니다. 여러 스펙에 걸린 경로는 처음 스펙을 따릅니다.
pub fn expand_inputs(inputs: &[InputSpec]) -> Result<Vec<InputItem>, SpoolPipelineError> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for input in inputs {
        if input.glob.trim().is_empty() {
            continue;
        }
        for path in expand_pattern(&input.glob)? {
            if seen.insert(path.clone()) {
                items.push(InputItem {
                    path,
                    alert_type: input.alert_type.clone(),
                    error_dir: input.error_dir.clone(),
                });
            }
        }
    }

    Ok(items)
}

/// 패턴 하나를 확장합니다 (`**` 지원).
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, SpoolPipelineError> {
    match pattern.find("**") {
        None => expand_glob(pattern),
        Some(idx) => expand_recursive(&pattern[..idx], &pattern[idx + 2..]),
    }
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, SpoolPipelineError> {
    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) => paths.push(path),
            // 읽을 수 없는 디렉토리는 건너뜁니다.
            Err(e) => debug!(pattern, error = %e, "glob entry unreadable, skipping"),
        }
    }
    Ok(paths)
}

fn expand_recursive(base: &str, suffix: &str) -> Result<Vec<PathBuf>, SpoolPipelineError> {
    let base = base.trim_end_matches(['/', std::path::MAIN_SEPARATOR]);
    let base = if base.is_empty() { "." } else { base };
    let base = Path::new(base);

    let suffix = suffix.trim_start_matches(['/', std::path::MAIN_SEPARATOR]);
    let suffix = if suffix.is_empty() { "*" } else { suffix };
    let basename_only = !suffix.contains('/');
    let matcher = Pattern::new(suffix)?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    if !base.exists() {
        debug!(base = %base.display(), "recursive glob base missing, no matches");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(base).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(base) else {
            continue;
        };
        let candidate = if basename_only {
            entry.file_name().to_string_lossy().into_owned()
        } else {
            rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/")
        };
        if matcher.matches_with(&candidate, options) {
            paths.push(path.to_path_buf());
        }
    }
    Ok(paths)
}
