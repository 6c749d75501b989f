//! 설정 관리 — alert-spooler.toml 파싱 및 런타임 설정
//!
//! [`SpoolerConfig`]는 스풀러 전체 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, 데몬에서 병합)
//! 2. 환경변수 (`ALERT_SPOOLER_DELIVERY_SYSLOG_ADDR=10.0.0.5:1514` 형식)
//! 3. 설정 파일 (`alert-spooler.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), alert_spooler_core::error::SpoolerError> {
//! use alert_spooler_core::config::SpoolerConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SpoolerConfig::load("alert-spooler.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SpoolerConfig::parse("[spooler]\njob = \"mhdbs\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SpoolerError};

/// 구조화 데이터 ID 기본값
pub const DEFAULT_SD_ID: &str = "cndp";

/// 앱 이름 기본값
pub const DEFAULT_APP_NAME: &str = "alert-spooler";

/// alert-spooler 통합 설정
///
/// `alert-spooler.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpoolerConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스토어 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 전송 설정
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// 스풀러 동작 설정
    #[serde(default)]
    pub spooler: SpoolConfig,
    /// 입력 목록
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
    /// 4문자 코드 태깅 설정
    #[serde(default)]
    pub tagging: TaggingConfig,
    /// 고정 레이블
    #[serde(default)]
    pub labels: LabelsConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SpoolerConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SpoolerError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    ///
    /// 유효성 검증은 CLI 병합 이후 호출자가 수행합니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SpoolerError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpoolerError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SpoolerError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SpoolerError> {
        toml::from_str(toml_str).map_err(|e| {
            SpoolerError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `ALERT_SPOOLER_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "ALERT_SPOOLER_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ALERT_SPOOLER_GENERAL_LOG_FORMAT");
        override_bool(&mut self.general.debug, "ALERT_SPOOLER_GENERAL_DEBUG");

        // Database
        override_string(&mut self.database.path, "ALERT_SPOOLER_DATABASE_PATH");
        override_string(&mut self.database.folder, "ALERT_SPOOLER_DATABASE_FOLDER");
        override_string(&mut self.database.prefix, "ALERT_SPOOLER_DATABASE_PREFIX");

        // Delivery
        override_string(
            &mut self.delivery.syslog_addr,
            "ALERT_SPOOLER_DELIVERY_SYSLOG_ADDR",
        );
        override_string(&mut self.delivery.app_name, "ALERT_SPOOLER_DELIVERY_APP_NAME");
        override_string(&mut self.delivery.service, "ALERT_SPOOLER_DELIVERY_SERVICE");
        override_string(&mut self.delivery.sd_id, "ALERT_SPOOLER_DELIVERY_SD_ID");
        override_u64(
            &mut self.delivery.send_timeout_ms,
            "ALERT_SPOOLER_DELIVERY_SEND_TIMEOUT_MS",
        );

        // Spooler
        override_string(&mut self.spooler.job, "ALERT_SPOOLER_SPOOLER_JOB");
        override_csv(&mut self.spooler.input_globs, "ALERT_SPOOLER_SPOOLER_INPUT_GLOBS");
        override_bool(
            &mut self.spooler.delete_after_send,
            "ALERT_SPOOLER_SPOOLER_DELETE_AFTER_SEND",
        );
        override_usize(
            &mut self.spooler.hash_hex_len,
            "ALERT_SPOOLER_SPOOLER_HASH_HEX_LEN",
        );
        override_u64(&mut self.spooler.timeout_secs, "ALERT_SPOOLER_SPOOLER_TIMEOUT_SECS");
        override_string(&mut self.spooler.deadman, "ALERT_SPOOLER_SPOOLER_DEADMAN");
        override_string(
            &mut self.spooler.event_time_offset,
            "ALERT_SPOOLER_SPOOLER_EVENT_TIME_OFFSET",
        );

        // Tagging
        override_csv(&mut self.tagging.codes, "ALERT_SPOOLER_TAGGING_CODES");

        // Labels
        override_string(&mut self.labels.env, "ALERT_SPOOLER_LABELS_ENV");
        override_string(&mut self.labels.site, "ALERT_SPOOLER_LABELS_SITE");
        override_string(&mut self.labels.cluster, "ALERT_SPOOLER_LABELS_CLUSTER");

        // Metrics
        override_bool(&mut self.metrics.enabled, "ALERT_SPOOLER_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "ALERT_SPOOLER_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "ALERT_SPOOLER_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SpoolerError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.database.folder.trim().is_empty() && self.database.path.trim().is_empty() {
            return Err(invalid(
                "database",
                "either database.folder or database.path is required".to_owned(),
            ));
        }

        if self.spooler.job.trim().is_empty() {
            return Err(invalid("spooler.job", "job label must not be empty".to_owned()));
        }

        let has_inputs = self.inputs.iter().any(|i| !i.glob.trim().is_empty())
            || self.spooler.input_globs.iter().any(|g| !g.trim().is_empty());
        if !has_inputs {
            return Err(invalid(
                "inputs",
                "at least one [[inputs]] glob or spooler.input_globs entry is required".to_owned(),
            ));
        }

        if self.delivery.syslog_addr.trim().is_empty() {
            return Err(invalid(
                "delivery.syslog_addr",
                "syslog address must not be empty".to_owned(),
            ));
        }

        if self.delivery.send_timeout_ms == 0 {
            return Err(invalid(
                "delivery.send_timeout_ms",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.spooler.hash_hex_len > 64 {
            return Err(invalid("spooler.hash_hex_len", "must be 0-64".to_owned()));
        }

        parse_utc_offset(&self.spooler.event_time_offset)?;

        Ok(())
    }

    /// `debug = true` 레거시 플래그를 반영한 유효 로그 레벨
    pub fn effective_log_level(&self) -> &str {
        if self.general.debug && self.general.log_level == "info" {
            "debug"
        } else {
            &self.general.log_level
        }
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 레거시 디버그 플래그
    pub debug: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            debug: false,
        }
    }
}

/// 스토어 설정
///
/// `folder`가 설정되면 월별 로테이션 모드(`<folder>/<prefix><YYYYMM>.db`)로,
/// 아니면 `path` 단일 파일 모드로 동작합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 단일 스토어 파일 경로
    pub path: String,
    /// 월별 스토어 폴더
    pub folder: String,
    /// 월별 스토어 파일 접두어
    pub prefix: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "spooler.db".to_owned(),
            folder: String::new(),
            prefix: "alerts_".to_owned(),
        }
    }
}

/// 전송 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// syslog TCP 수신 주소
    pub syslog_addr: String,
    /// RFC 5424 APP-NAME
    pub app_name: String,
    /// 구조화 데이터 `service` 레이블
    pub service: String,
    /// 전송 1회당 타임아웃 상한 (밀리초)
    pub send_timeout_ms: u64,
    /// 구조화 데이터 ID
    pub sd_id: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            syslog_addr: "127.0.0.1:1514".to_owned(),
            app_name: DEFAULT_APP_NAME.to_owned(),
            service: "alerts".to_owned(),
            send_timeout_ms: 3000,
            sd_id: DEFAULT_SD_ID.to_owned(),
        }
    }
}

/// 스풀러 동작 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// 구조화 데이터 `job` 레이블 (필수)
    pub job: String,
    /// 레거시 입력 glob (알림 유형은 경로에서 추론)
    pub input_globs: Vec<String>,
    /// 전송 확인 후 원본 삭제 여부
    pub delete_after_send: bool,
    /// 지문 16진수 길이 (0이면 전체)
    pub hash_hex_len: usize,
    /// 사이클 전체 타임아웃 (초, 0이면 무제한)
    pub timeout_secs: u64,
    /// 하트비트 토큰 (비어 있으면 하트비트를 보내지 않음)
    pub deadman: String,
    /// 시간대 없는 타임스탬프에 적용할 UTC 오프셋 (`+08:00` 형식)
    pub event_time_offset: String,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            job: String::new(),
            input_globs: Vec::new(),
            delete_after_send: true,
            hash_hex_len: 24,
            timeout_secs: 0,
            deadman: String::new(),
            event_time_offset: "+08:00".to_owned(),
        }
    }
}

/// 입력 스펙
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// 파일 glob (`**` 재귀 세그먼트 지원)
    pub glob: String,
    /// 강제 알림 유형 (라우팅 분류)
    pub alert_type: String,
    /// 디코딩 불가 파일을 옮길 디렉토리
    pub error_dir: String,
}

/// 4문자 코드 태깅 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// 레거시 플래그. 무시되며, 태깅은 `codes`가 비어 있지 않을 때 활성화됩니다.
    pub enabled: bool,
    /// 코드 목록 (설정 순서대로 매칭)
    pub codes: Vec<String>,
}

/// 구조화 데이터 고정 레이블
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    /// 환경 (prod, staging 등)
    pub env: String,
    /// 사이트
    pub site: String,
    /// 클러스터
    pub cluster: String,
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 익스포터 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
        }
    }
}

/// `+08:00` / `-05:30` / `Z` 형식의 UTC 오프셋을 파싱합니다.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, SpoolerError> {
    let s = value.trim();
    if s.eq_ignore_ascii_case("z") || s.is_empty() {
        return FixedOffset::east_opt(0)
            .ok_or_else(|| invalid("spooler.event_time_offset", "invalid offset".to_owned()));
    }

    let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = s.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid(
            "spooler.event_time_offset",
            format!("'{s}' must start with '+' or '-'"),
        ));
    };

    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: u32 = hours.parse().map_err(|_| {
        invalid("spooler.event_time_offset", format!("invalid hours in '{s}'"))
    })?;
    let minutes: u32 = minutes.parse().map_err(|_| {
        invalid("spooler.event_time_offset", format!("invalid minutes in '{s}'"))
    })?;
    if hours > 23 || minutes > 59 {
        return Err(invalid(
            "spooler.event_time_offset",
            format!("'{s}' out of range"),
        ));
    }

    // 범위 검사 후라서 i32로 안전하게 계산됩니다.
    let seconds = (hours * 3600 + minutes * 60) as i32;
    FixedOffset::east_opt(sign * seconds)
        .ok_or_else(|| invalid("spooler.event_time_offset", format!("'{s}' out of range")))
}

fn invalid(field: &str, reason: String) -> SpoolerError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> SpoolerConfig {
        SpoolerConfig::parse(
            r#"
[spooler]
job = "mhdbs"
input_globs = ["/tmp/alerts/*.warn"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn default_config_has_sane_values() {
        let config = SpoolerConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.delivery.syslog_addr, "127.0.0.1:1514");
        assert_eq!(config.delivery.app_name, "alert-spooler");
        assert_eq!(config.delivery.sd_id, "cndp");
        assert_eq!(config.spooler.hash_hex_len, 24);
        assert!(config.spooler.delete_after_send);
        assert_eq!(config.database.prefix, "alerts_");
    }

    #[test]
    fn default_config_needs_job_and_inputs() {
        let err = SpoolerConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("spooler.job"));
    }

    #[test]
    fn minimal_config_passes_validation() {
        minimal().validate().unwrap();
    }

    #[test]
    fn parse_inputs_and_labels() {
        let toml = r#"
[database]
folder = "/var/lib/alert-spooler"
prefix = "spooler_"

[spooler]
job = "mhdbs"
deadman = "beat"

[[inputs]]
glob = "/data/alerts/business/*.warn"
alert_type = "business"

[[inputs]]
glob = "/data/alerts/dev/**/*.alarm"
alert_type = "dev"
error_dir = "/data/alerts/dev_err"

[tagging]
enabled = false
codes = ["ZBBB", "ZGGG"]

[labels]
env = "prod"
site = "bj"
"#;
        let config = SpoolerConfig::parse(toml).unwrap();
        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.inputs[1].error_dir, "/data/alerts/dev_err");
        assert_eq!(config.tagging.codes, vec!["ZBBB", "ZGGG"]);
        assert_eq!(config.labels.env, "prod");
        assert!(config.labels.cluster.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = SpoolerConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            SpoolerError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = minimal();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_missing_store() {
        let mut config = minimal();
        config.database.path.clear();
        config.database.folder.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("database"));
    }

    #[test]
    fn validate_rejects_oversized_hash_len() {
        let mut config = minimal();
        config.spooler.hash_hex_len = 65;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hash_hex_len"));
    }

    #[test]
    fn validate_rejects_bad_offset() {
        let mut config = minimal();
        config.spooler.event_time_offset = "08:00".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("event_time_offset"));
    }

    #[test]
    fn offset_parsing() {
        assert_eq!(parse_utc_offset("+08:00").unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(
            parse_utc_offset("-05:30").unwrap().local_minus_utc(),
            -(5 * 3600 + 30 * 60)
        );
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+9").unwrap().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn offset_with_unicode_minus_is_config_error() {
        let err = parse_utc_offset("\u{2212}08:00").unwrap_err();
        assert!(matches!(
            err,
            SpoolerError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn offset_out_of_range_is_config_error() {
        for text in ["+1000000:00", "+24:00", "-08:60", "+-5:00", "+99999999999:00"] {
            let err = parse_utc_offset(text).unwrap_err();
            assert!(err.to_string().contains("event_time_offset"), "{text}: {err}");
        }
        assert_eq!(
            parse_utc_offset("-23:59").unwrap().local_minus_utc(),
            -(23 * 3600 + 59 * 60)
        );
    }

    #[test]
    fn debug_flag_raises_log_level() {
        let mut config = minimal();
        config.general.debug = true;
        assert_eq!(config.effective_log_level(), "debug");
        config.general.log_level = "warn".to_owned();
        assert_eq!(config.effective_log_level(), "warn");
    }

    #[test]
    #[serial_test::serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("TEST_ALERT_SPOOLER_STR", "overridden") };
        override_string(&mut val, "TEST_ALERT_SPOOLER_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_ALERT_SPOOLER_STR") };
    }

    #[test]
    #[serial_test::serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("TEST_ALERT_SPOOLER_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_ALERT_SPOOLER_BOOL_BAD");
        assert!(!val);
        unsafe { std::env::remove_var("TEST_ALERT_SPOOLER_BOOL_BAD") };
    }

    #[test]
    #[serial_test::serial]
    fn env_override_csv_drops_empty_items() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("TEST_ALERT_SPOOLER_CSV", "ZBBB, ,ZGGG") };
        override_csv(&mut val, "TEST_ALERT_SPOOLER_CSV");
        assert_eq!(val, vec!["ZBBB", "ZGGG"]);
        unsafe { std::env::remove_var("TEST_ALERT_SPOOLER_CSV") };
    }

    #[test]
    #[serial_test::serial]
    fn apply_env_overrides_reaches_delivery_section() {
        let mut config = minimal();
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("ALERT_SPOOLER_DELIVERY_SYSLOG_ADDR", "10.0.0.5:1514") };
        config.apply_env_overrides();
        unsafe { std::env::remove_var("ALERT_SPOOLER_DELIVERY_SYSLOG_ADDR") };
        assert_eq!(config.delivery.syslog_addr, "10.0.0.5:1514");
    }

    #[test]
    #[serial_test::serial]
    fn apply_env_overrides_reaches_offset_sd_id_and_port() {
        let mut config = minimal();
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe {
            std::env::set_var("ALERT_SPOOLER_SPOOLER_EVENT_TIME_OFFSET", "+09:00");
            std::env::set_var("ALERT_SPOOLER_DELIVERY_SD_ID", "alrt");
            std::env::set_var("ALERT_SPOOLER_METRICS_PORT", "19300");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("ALERT_SPOOLER_SPOOLER_EVENT_TIME_OFFSET");
            std::env::remove_var("ALERT_SPOOLER_DELIVERY_SD_ID");
            std::env::remove_var("ALERT_SPOOLER_METRICS_PORT");
        }
        assert_eq!(config.spooler.event_time_offset, "+09:00");
        assert_eq!(config.delivery.sd_id, "alrt");
        assert_eq!(config.metrics.port, 19300);
    }

    #[test]
    #[serial_test::serial]
    fn env_override_port_invalid_keeps_original() {
        let mut port = 9464u16;
        // SAFETY: serial 테스트로 환경변수 동시 접근이 없습니다.
        unsafe { std::env::set_var("TEST_ALERT_SPOOLER_PORT_BAD", "70000") };
        override_u16(&mut port, "TEST_ALERT_SPOOLER_PORT_BAD");
        assert_eq!(port, 9464);
        unsafe { std::env::remove_var("TEST_ALERT_SPOOLER_PORT_BAD") };
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = SpoolerConfig::from_file("/nonexistent/path/alert-spooler.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SpoolerError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
