//! 에러 디렉토리 이동
//!
//! 디코딩할 수 없는 입력을 입력 경로 밖으로 옮겨 다시 스캔되지 않게 합니다.
//! 대상 이름이 이미 있으면 덮어쓰지 않고 `-<unix nanos>` 접미어를 붙입니다.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::SpoolPipelineError;

/// `src`를 `dir` 아래로 옮기고 최종 경로를 반환합니다.
///
/// rename이 실패하면(다른 장치 등) 복사 후 원본 삭제로 대체하며,
/// 복사가 실패하면 만들다 만 대상 파일을 지웁니다.
pub async fn relocate(src: &Path, dir: &Path) -> Result<PathBuf, SpoolPipelineError> {
    if dir.as_os_str().is_empty() {
        return Err(relocate_err(src, "destination directory is empty"));
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| relocate_err(src, &format!("create {}: {e}", dir.display())))?;

    let file_name = src
        .file_name()
        .ok_or_else(|| relocate_err(src, "source has no file name"))?;
    let mut dst = dir.join(file_name);
    if tokio::fs::try_exists(&dst).await.unwrap_or(false) {
        dst = dir.join(collision_name(src));
    }

    if tokio::fs::rename(src, &dst).await.is_ok() {
        return Ok(dst);
    }
    debug!(src = %src.display(), dst = %dst.display(), "rename failed, falling back to copy");

    if let Err(e) = tokio::fs::copy(src, &dst).await {
        let _ = tokio::fs::remove_file(&dst).await;
        return Err(relocate_err(src, &format!("copy to {}: {e}", dst.display())));
    }
    tokio::fs::remove_file(src)
        .await
        .map_err(|e| relocate_err(src, &format!("remove after copy: {e}")))?;
    Ok(dst)
}

/// `name.ext` → `name-<unix nanos>.ext`
fn collision_name(src: &Path) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match src.extension() {
        Some(ext) => format!("{stem}-{nanos}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{nanos}"),
    }
}

fn relocate_err(src: &Path, reason: &str) -> SpoolPipelineError {
    SpoolPipelineError::Relocate {
        path: src.display().to_string(),
        reason: reason.to_owned(),
    }
}
