//! 러너 설정
//!
//! [`RunnerConfig`]는 core의 [`SpoolerConfig`]에서 러너가 실제로 쓰는 값만 뽑아
//! 정규화한 설정입니다. 빌더로 직접 구성할 수도 있습니다.
//!
//! # 사용 예시
//! ```
//! use alert_spooler_pipeline::config::{InputSpec, RunnerConfig};
//!
//! let config = RunnerConfig::builder()
//!     .db_folder("/var/lib/alert-spooler")
//!     .job("mhdbs")
//!     .input(InputSpec::new("/data/alerts/dev/**/*.alarm").alert_type("dev"))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.db_prefix, "alerts_");
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use alert_spooler_core::config::{
    DEFAULT_APP_NAME, DEFAULT_SD_ID, SpoolerConfig, parse_utc_offset,
};
use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::error::SpoolPipelineError;

/// 월별 스토어 파일 접두어 기본값
pub const DEFAULT_DB_PREFIX: &str = "alerts_";

/// 전송 1회 타임아웃 상한 기본값
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(3);

/// 입력 스펙 — glob 하나와 그 매칭 파일의 라우팅 정보
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSpec {
    /// 파일 glob (`**` 재귀 세그먼트 지원)
    pub glob: String,
    /// 강제 알림 유형. 없으면 경로에서 추론합니다.
    pub alert_type: Option<String>,
    /// 디코딩 불가 파일을 옮길 디렉토리
    pub error_dir: Option<PathBuf>,
}

impl InputSpec {
    /// glob만 지정된 입력 스펙
    pub fn new(glob: impl Into<String>) -> Self {
        Self {
            glob: glob.into(),
            ..Default::default()
        }
    }

    /// 알림 유형을 지정합니다. 빈 값은 무시됩니다.
    pub fn alert_type(mut self, alert_type: impl Into<String>) -> Self {
        self.alert_type = non_empty(alert_type.into());
        self
    }

    /// 에러 디렉토리를 지정합니다. 빈 값은 무시됩니다.
    pub fn error_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.error_dir = (!dir.as_os_str().is_empty()).then_some(dir);
        self
    }
}

/// 러너 설정
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// 단일 스토어 경로 (`db_folder`가 없을 때 사용)
    pub db_path: PathBuf,
    /// 월별 스토어 폴더
    pub db_folder: Option<PathBuf>,
    /// 월별 스토어 파일 접두어
    pub db_prefix: String,
    /// 입력 목록 (레거시 glob이 앞에 옵니다)
    pub inputs: Vec<InputSpec>,
    /// 구조화 데이터 ID
    pub sd_id: String,
    /// RFC 5424 APP-NAME
    pub app_name: String,
    /// 고정 레이블 (job, service, env, site, cluster)
    pub labels: BTreeMap<String, String>,
    /// 지문 16진수 길이
    pub hash_hex_len: usize,
    /// 태깅 코드 목록
    pub tag_codes: Vec<String>,
    /// 전송 확인 후 원본 삭제 여부
    pub delete_after_send: bool,
    /// 사이클 전체 타임아웃 (없으면 무제한)
    pub timeout: Option<Duration>,
    /// 전송 1회 타임아웃 상한
    pub send_timeout: Duration,
    /// 하트비트 토큰
    pub deadman: Option<String>,
    /// 리플레이 시작 시각. 설정되면 사이클은 리플레이만 수행합니다.
    pub replay_from: Option<DateTime<Utc>>,
    /// 시간대 없는 이벤트 타임스탬프의 오프셋
    pub event_time_offset: FixedOffset,
}

impl RunnerConfig {
    /// 빌더를 생성합니다.
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::new()
    }

    /// core 설정에서 러너 설정을 만듭니다.
    pub fn from_core(core: &SpoolerConfig) -> Result<Self, SpoolPipelineError> {
        let offset = parse_utc_offset(&core.spooler.event_time_offset).map_err(|e| {
            SpoolPipelineError::Config {
                field: "spooler.event_time_offset".to_owned(),
                reason: e.to_string(),
            }
        })?;

        let mut builder = RunnerConfigBuilder::new()
            .db_path(&core.database.path)
            .db_prefix(&core.database.prefix)
            .job(&core.spooler.job)
            .service(&core.delivery.service)
            .app_name(&core.delivery.app_name)
            .sd_id(&core.delivery.sd_id)
            .label("env", &core.labels.env)
            .label("site", &core.labels.site)
            .label("cluster", &core.labels.cluster)
            .hash_hex_len(core.spooler.hash_hex_len)
            .tag_codes(core.tagging.codes.clone())
            .delete_after_send(core.spooler.delete_after_send)
            .send_timeout(Duration::from_millis(core.delivery.send_timeout_ms))
            .deadman(&core.spooler.deadman)
            .event_time_offset(offset);

        if !core.database.folder.trim().is_empty() {
            builder = builder.db_folder(&core.database.folder);
        }
        if core.spooler.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(core.spooler.timeout_secs));
        }
        for glob in &core.spooler.input_globs {
            builder = builder.input(InputSpec::new(glob.as_str()));
        }
        for input in &core.inputs {
            builder = builder.input(
                InputSpec::new(input.glob.as_str())
                    .alert_type(input.alert_type.as_str())
                    .error_dir(input.error_dir.as_str()),
            );
        }
        builder.build()
    }

    /// 작업 레이블
    pub fn job(&self) -> &str {
        self.labels.get("job").map(String::as_str).unwrap_or_default()
    }
}

/// [`RunnerConfig`] 빌더
#[derive(Debug, Clone)]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    /// 기본값으로 빌더를 생성합니다.
    pub fn new() -> Self {
        let mut labels = BTreeMap::new();
        labels.insert("service".to_owned(), "alerts".to_owned());
        Self {
            config: RunnerConfig {
                db_path: PathBuf::new(),
                db_folder: None,
                db_prefix: DEFAULT_DB_PREFIX.to_owned(),
                inputs: Vec::new(),
                sd_id: DEFAULT_SD_ID.to_owned(),
                app_name: DEFAULT_APP_NAME.to_owned(),
                labels,
                hash_hex_len: 24,
                tag_codes: Vec::new(),
                delete_after_send: true,
                timeout: None,
                send_timeout: DEFAULT_SEND_TIMEOUT,
                deadman: None,
                replay_from: None,
                event_time_offset: FixedOffset::east_opt(8 * 3600)
                    .unwrap_or_else(|| Utc.fix()),
            },
        }
    }

    /// 단일 스토어 경로
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// 월별 스토어 폴더
    pub fn db_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.db_folder = Some(folder.into());
        self
    }

    /// 월별 스토어 접두어. 빈 값이면 기본값을 유지합니다.
    pub fn db_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.trim().is_empty() {
            self.config.db_prefix = prefix;
        }
        self
    }

    /// 입력 하나를 추가합니다.
    pub fn input(mut self, input: InputSpec) -> Self {
        self.config.inputs.push(input);
        self
    }

    /// 작업 레이블
    pub fn job(self, job: impl Into<String>) -> Self {
        self.label("job", job)
    }

    /// 서비스 레이블. 빈 값이면 기본값을 유지합니다.
    pub fn service(self, service: impl Into<String>) -> Self {
        let service = service.into();
        if service.trim().is_empty() {
            return self;
        }
        self.label("service", service)
    }

    /// 고정 레이블 하나를 설정합니다.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.labels.insert(key.into(), value.into());
        self
    }

    /// RFC 5424 APP-NAME
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.config.app_name = app_name.into();
        self
    }

    /// 구조화 데이터 ID
    pub fn sd_id(mut self, sd_id: impl Into<String>) -> Self {
        self.config.sd_id = sd_id.into();
        self
    }

    /// 지문 길이
    pub fn hash_hex_len(mut self, len: usize) -> Self {
        self.config.hash_hex_len = len;
        self
    }

    /// 태깅 코드 목록
    pub fn tag_codes(mut self, codes: Vec<String>) -> Self {
        self.config.tag_codes = codes;
        self
    }

    /// 전송 확인 후 삭제 여부
    pub fn delete_after_send(mut self, enabled: bool) -> Self {
        self.config.delete_after_send = enabled;
        self
    }

    /// 사이클 전체 타임아웃
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// 전송 1회 타임아웃 상한
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    /// 하트비트 토큰. 빈 값이면 하트비트를 보내지 않습니다.
    pub fn deadman(mut self, token: impl Into<String>) -> Self {
        self.config.deadman = non_empty(token.into());
        self
    }

    /// 리플레이 시작 시각
    pub fn replay_from(mut self, from: DateTime<Utc>) -> Self {
        self.config.replay_from = Some(from);
        self
    }

    /// 시간대 없는 타임스탬프의 오프셋
    pub fn event_time_offset(mut self, offset: FixedOffset) -> Self {
        self.config.event_time_offset = offset;
        self
    }

    /// 설정을 검증하고 생성합니다.
    pub fn build(self) -> Result<RunnerConfig, SpoolPipelineError> {
        let config = self.config;

        if config.db_folder.is_none() && config.db_path.as_os_str().is_empty() {
            return Err(config_err("database", "db path or db folder is required"));
        }
        if config.job().trim().is_empty() {
            return Err(config_err("spooler.job", "job label is required"));
        }
        if !config.inputs.iter().any(|i| !i.glob.trim().is_empty()) {
            return Err(config_err("inputs", "at least one input glob is required"));
        }
        if config.send_timeout.is_zero() {
            return Err(config_err("delivery.send_timeout_ms", "must be greater than 0"));
        }

        Ok(config)
    }
}

impl Default for RunnerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn config_err(field: &str, reason: &str) -> SpoolPipelineError {
    SpoolPipelineError::Config {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
