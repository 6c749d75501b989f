//! RFC 5424 구조화 데이터 인코더
//!
//! `[id k1="v1" k2="v2"]` 형태로 렌더링합니다. 다운스트림 파서가 기대하는
//! 고정 키 순서를 먼저 적용하고, 나머지 키는 이름 오름차순으로 붙입니다.

use std::collections::BTreeMap;

use alert_spooler_core::config::DEFAULT_SD_ID;

/// 고정 출력 순서
pub const PREFERRED_ORDER: &[&str] = &[
    "job",
    "service",
    "env",
    "site",
    "cluster",
    "filename",
    "alert_type",
    "alert_level",
    "hash",
    "tag",
    "replay",
    "deadman",
];

/// 구조화 데이터 파라미터 (키 → 값)
pub type SdParams = BTreeMap<String, String>;

/// 파라미터를 구조화 데이터 요소로 인코딩합니다.
///
/// - `id`가 비어 있으면 기본 ID(`cndp`)를 사용합니다.
/// - 값이 비어 있거나 공백뿐인 키는 출력하지 않습니다.
pub fn encode(id: &str, params: &SdParams) -> String {
    let id = if id.trim().is_empty() { DEFAULT_SD_ID } else { id };

    let mut out = String::with_capacity(64 + params.len() * 24);
    out.push('[');
    out.push_str(id);

    for key in PREFERRED_ORDER {
        if let Some(value) = params.get(*key) {
            push_param(&mut out, key, value);
        }
    }
    // BTreeMap 순회는 키 오름차순
    for (key, value) in params {
        if !PREFERRED_ORDER.contains(&key.as_str()) {
            push_param(&mut out, key, value);
        }
    }

    out.push(']');
    out
}

fn push_param(out: &mut String, key: &str, value: &str) {
    if value.trim().is_empty() {
        return;
    }
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape_param_value(value));
    out.push('"');
}

/// 파라미터 값을 이스케이프합니다.
///
/// `\` → `\\`, `"` → `\"`, `]` → `\]`, 개행/CR → 공백
pub fn escape_param_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            ']' => out.push_str("\\]"),
            '\n' | '\r' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}
