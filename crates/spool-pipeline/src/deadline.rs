//! 사이클 전체 마감 시각
//!
//! 단계 사이와 전송 직전에 확인하며, 각 전송은 남은 시간과 상한 중 작은 값을
//! 타임아웃으로 사용합니다.

use std::time::{Duration, Instant};

use crate::error::SpoolPipelineError;

/// 마감이 지난 뒤에도 시도하는 전송(하트비트)의 최소 타임아웃
pub const MIN_SEND_TIMEOUT: Duration = Duration::from_millis(1);

/// 사이클 마감 시각. `None`이면 무제한입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// 마감 없음
    pub fn unbounded() -> Self {
        Self(None)
    }

    /// 지금부터 `timeout` 뒤에 마감. `None`이면 무제한입니다.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.map(|t| Instant::now() + t))
    }

    /// 마감이 지났는지 확인합니다.
    pub fn is_exceeded(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() > at)
    }

    /// 마감이 지났으면 [`SpoolPipelineError::DeadlineExceeded`]를 반환합니다.
    pub fn check(&self) -> Result<(), SpoolPipelineError> {
        if self.is_exceeded() {
            return Err(SpoolPipelineError::DeadlineExceeded);
        }
        Ok(())
    }

    /// 전송 1회에 쓸 타임아웃
    ///
    /// - 마감 없음 → `cap`
    /// - 마감 지남 → 1ms (전송은 그래도 시도됩니다)
    /// - 그 외 → `min(남은 시간, cap)`
    pub fn send_timeout(&self, cap: Duration) -> Duration {
        let Some(at) = self.0 else {
            return cap;
        };
        let remaining = at.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return MIN_SEND_TIMEOUT;
        }
        if cap.is_zero() {
            return remaining;
        }
        remaining.min(cap)
    }
}
