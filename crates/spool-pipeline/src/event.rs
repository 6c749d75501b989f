//! 알림 파일 → 이벤트 변환
//!
//! 디코딩된 JSON 하나(객체 또는 배열)를 하나 이상의 [`SpoolEvent`]로 만듭니다.
//! 각 이벤트는 정규 재인코딩, 평탄화 결과, 정규화된 키 텍스트, 지문, 태그,
//! 알림 레벨을 함께 갖습니다.

use std::path::Path;
use std::time::Duration;

use alert_spooler_core::types::{AlertLevel, SourceType};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use serde_json::value::RawValue;

use crate::error::SpoolPipelineError;
use crate::flatten::{FlattenOptions, flatten};
use crate::models::SpoolEvent;
use crate::normalize::{Normalizer, fingerprint};
use crate::tag::{NO_TAG, tag};

/// 이벤트 시각으로 인정하는 키 (우선순위 순)
pub const EVENT_TIME_KEYS: &[&str] = &[
    "time",
    "timestamp",
    "ts",
    "occur_time",
    "occurTime",
    "created_at",
    "createdAt",
    "alert_time",
    "alertTime",
];

/// 알림 레벨을 담는 키 (우선순위 순)
const LEVEL_KEYS: &[&str] = &["status", "level", "severity"];

/// 시간대 없는 타임스탬프 형식
const NAIVE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// 이벤트가 나온 파일의 공통 정보
#[derive(Debug, Clone)]
pub struct FileContext {
    /// 원본 경로
    pub path: String,
    /// 소스 유형
    pub source_type: String,
    /// 라우팅 분류
    pub alert_type: String,
    /// 파일 전체 SHA-256
    pub sha256: String,
    /// 원본 내용
    pub raw: String,
}

impl FileContext {
    /// 경로와 내용에서 컨텍스트를 만듭니다. 알림 유형이 없으면 경로에서 추론합니다.
    pub fn new(path: &Path, forced_alert_type: Option<&str>, sha256: String, raw: String) -> Self {
        let alert_type = forced_alert_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| infer_alert_type(path));
        Self {
            path: path.display().to_string(),
            source_type: SourceType::from_path(path).as_str().to_owned(),
            alert_type,
            sha256,
            raw,
        }
    }
}

/// 이벤트 빌더
#[derive(Debug, Clone)]
pub struct EventBuilder {
    normalizer: Normalizer,
    hash_hex_len: usize,
    tag_codes: Vec<String>,
    flatten: FlattenOptions,
}

impl EventBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new(hash_hex_len: usize, tag_codes: Vec<String>) -> Result<Self, SpoolPipelineError> {
        Ok(Self {
            normalizer: Normalizer::new()?,
            hash_hex_len,
            tag_codes,
            flatten: FlattenOptions::default(),
        })
    }

    /// 디코딩된 값을 이벤트 목록으로 변환합니다.
    ///
    /// 배열은 원소마다 하나, 그 외 값은 하나의 이벤트가 됩니다.
    /// 배열 원소 하나의 구성 실패는 그 인덱스의 에러 이벤트로 대체되고,
    /// 단일 값의 구성 실패는 파일 전체 실패로 반환됩니다.
    pub fn build_all(
        &self,
        decoded: &Value,
        ctx: &FileContext,
    ) -> Result<Vec<SpoolEvent>, SpoolPipelineError> {
        let now = Utc::now();
        match decoded {
            Value::Array(items) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let idx = i64::try_from(i).unwrap_or(i64::MAX);
                    self.build(item, ctx, idx, now)
                        .unwrap_or_else(|e| error_event(ctx, idx, &e.to_string()))
                })
                .collect()),
            single => Ok(vec![self.build(single, ctx, 0, now)?]),
        }
    }

    /// 값 하나로 이벤트를 만듭니다.
    pub fn build(
        &self,
        item: &Value,
        ctx: &FileContext,
        index: i64,
        now: DateTime<Utc>,
    ) -> Result<SpoolEvent, SpoolPipelineError> {
        let event_json = serde_json::to_string(item)?;
        let flat_json = serde_json::to_string(&flatten(item, self.flatten))?;

        let key_text = key_text(item);
        let normalized = self.normalizer.normalize(&key_text);
        let content_hash = fingerprint(&normalized, self.hash_hex_len);

        Ok(SpoolEvent {
            id: 0,
            ingested_at: now,
            source_path: ctx.path.clone(),
            source_type: ctx.source_type.clone(),
            alert_type: ctx.alert_type.clone(),
            alert_level: alert_level(item, Path::new(&ctx.path)).as_str().to_owned(),
            tag: tag(&key_text, &self.tag_codes),
            event_index: index,
            file_sha256: ctx.sha256.clone(),
            raw_content: ctx.raw.clone(),
            event_json,
            flat_json,
            normalized,
            content_hash,
            sent: false,
            send_error: String::new(),
            sent_at: None,
            archived_at: now,
        })
    }
}

/// 디코딩/구성 실패를 기록하는 합성 이벤트
pub fn error_event(ctx: &FileContext, index: i64, cause: &str) -> SpoolEvent {
    let now = Utc::now();
    SpoolEvent {
        id: 0,
        ingested_at: now,
        source_path: ctx.path.clone(),
        source_type: ctx.source_type.clone(),
        alert_type: ctx.alert_type.clone(),
        alert_level: AlertLevel::Unknown.as_str().to_owned(),
        tag: NO_TAG.to_owned(),
        event_index: index,
        file_sha256: ctx.sha256.clone(),
        raw_content: ctx.raw.clone(),
        event_json: "{}".to_owned(),
        flat_json: "{}".to_owned(),
        normalized: String::new(),
        content_hash: String::new(),
        sent: false,
        send_error: format!("decode/build error: {cause}"),
        sent_at: None,
        archived_at: now,
    }
}

/// 지문 계산에 쓰는 텍스트: `detail` → `description` → 전체 JSON
pub fn key_text(item: &Value) -> String {
    for key in ["detail", "description"] {
        if let Some(Value::String(s)) = item.get(key) {
            return s.clone();
        }
    }
    item.to_string()
}

/// 경로에서 라우팅 분류를 추론합니다.
pub fn infer_alert_type(path: &Path) -> String {
    let p = path.to_string_lossy().replace('\\', "/").to_lowercase();
    let inferred = if p.contains("/dev/") {
        "dev"
    } else if p.contains("/iec/") {
        "iec"
    } else if p.contains("/business/") {
        "business"
    } else if p.contains("/general/") {
        "general"
    } else if SourceType::from_path(path) == SourceType::Alarm {
        "dev"
    } else {
        "unknown"
    };
    inferred.to_owned()
}

/// `status` / `level` / `severity` 필드 또는 확장자로 알림 레벨을 결정합니다.
pub fn alert_level(item: &Value, path: &Path) -> AlertLevel {
    if let Value::Object(map) = item {
        for key in LEVEL_KEYS {
            if let Some(v) = map.get(*key) {
                return AlertLevel::from_status(&level_text(v));
            }
        }
    }
    AlertLevel::from_extension(path)
}

/// 레벨 값을 텍스트로 바꿉니다. 정수 값인 실수는 소수부 없이 씁니다 (`2.0` → `2`).
fn level_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// 이벤트 객체에서 발생 시각을 찾습니다.
pub fn event_time(item: &Value, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    let map = item.as_object()?;
    EVENT_TIME_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(|v| parse_time_value(v, offset))
}

/// `now - 이벤트 시각`. 시각이 없거나 미래면 `None`입니다.
pub fn event_lag(now: DateTime<Utc>, item: &Value, offset: &FixedOffset) -> Option<Duration> {
    let at = event_time(item, offset)?;
    (now - at).to_std().ok()
}

/// 저장된 이벤트 JSON에서 지연을 계산합니다.
pub fn stored_event_lag(now: DateTime<Utc>, event_json: &str, offset: &FixedOffset) -> Option<Duration> {
    let item: Value = serde_json::from_str(event_json).ok()?;
    event_lag(now, &item, offset)
}

fn parse_time_value(value: &Value, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_time_str(s, offset),
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?;
            if secs <= 0 {
                return None;
            }
            DateTime::from_timestamp(secs, 0)
        }
        _ => None,
    }
}

/// RFC 3339 또는 시간대 없는 일반 형식(`offset` 기준)을 파싱합니다.
pub fn parse_time_str(text: &str, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_TIME_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(text, fmt).ok()?;
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|t| t.with_timezone(&Utc))
    })
}

/// 전송 메시지 본문 `{source, event_index, event, flat}`
///
/// `event`와 `flat`은 문자열이 아닌 JSON 그대로 포함됩니다.
#[derive(Debug, Serialize)]
struct Payload<'a> {
    source: &'a str,
    event_index: i64,
    event: &'a RawValue,
    flat: &'a RawValue,
}

/// 이벤트의 전송 메시지를 인코딩합니다.
pub fn encode_payload(ev: &SpoolEvent) -> Result<String, SpoolPipelineError> {
    let event: &RawValue = serde_json::from_str(&ev.event_json)?;
    let flat: &RawValue = serde_json::from_str(&ev.flat_json)?;
    let payload = Payload {
        source: &ev.source_path,
        event_index: ev.event_index,
        event,
        flat,
    };
    Ok(serde_json::to_string(&payload)?)
}
