//! 텍스트 정규화와 지문(fingerprint) 계산
//!
//! 같은 알림이 발생 시각만 바꿔 반복될 때 같은 지문을 얻기 위해,
//! 타임스탬프 형태의 부분 문자열을 제거하고 공백을 정리한 뒤 SHA-256으로 해시합니다.
//! 지문은 다운스트림 그룹핑 레이블이며 저장 키가 아닙니다.

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::SpoolPipelineError;

/// 제거할 타임스탬프 패턴 (적용 순서대로)
///
/// 소수 초를 포함하는 긴 패턴이 먼저 적용되어야 `.123` 같은 꼬리가 남지 않습니다.
const TIMESTAMP_PATTERNS: &[&str] = &[
    r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3,6}",
    r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3,6}",
    r"\d{4}\.\d{2}\.\d{2}T\d{2}:\d{2}:\d{2}(\.\d{3,6})?",
    r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}",
    r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}",
    r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}",
    r"\d{4}/\d{2}/\d{2} \d{2}:\d{2}",
    r"\d{4}-\d{1,2}-\d{1,2} \d{1,2}:\d{1,2}:\d{1,2}",
];

/// 타임스탬프 제거기
///
/// 정규식은 생성 시 한 번만 컴파일됩니다.
#[derive(Debug, Clone)]
pub struct Normalizer {
    patterns: Vec<Regex>,
}

impl Normalizer {
    /// 내장 패턴 목록으로 정규화기를 생성합니다.
    pub fn new() -> Result<Self, SpoolPipelineError> {
        let patterns = TIMESTAMP_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// 타임스탬프를 제거하고 공백을 하나로 합칩니다.
    pub fn normalize(&self, input: &str) -> String {
        let mut text = input.to_owned();
        for re in &self.patterns {
            if re.is_match(&text) {
                text = re.replace_all(&text, "").into_owned();
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// 정규화된 텍스트의 SHA-256 16진수 지문을 `hex_len` 길이로 자릅니다.
///
/// `hex_len`이 0이거나 전체 길이(64) 이상이면 전체 다이제스트를 반환합니다.
pub fn fingerprint(normalized: &str, hex_len: usize) -> String {
    let full = sha256_hex(normalized.as_bytes());
    if hex_len == 0 || hex_len >= full.len() {
        return full;
    }
    full[..hex_len].to_owned()
}

/// 바이트열의 SHA-256 16진수 다이제스트
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
