//! 临时文件管理
//!
//! 上传内容先写入临时目录，文件名由 UUID v4 与原始扩展名组成，
//! 并发请求即使题号相同也不会冲突。

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::UploadPayload;

/// 临时文件管理器
pub struct TempFileManager {
    temp_dir: PathBuf,
}

impl TempFileManager {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    /// 把上传内容写入临时目录
    ///
    /// 文件名缺少扩展名时返回 `ValidationError`，此时不会写入任何文件。
    /// 临时目录需要事先存在。
    pub async fn stage(&self, payload: &UploadPayload) -> AppResult<StagedFile> {
        let extension = payload.extension()?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.temp_dir.join(file_name);

        fs::write(&path, payload.content())
            .await
            .map_err(|source| AppError::write_failed(&path, source))?;

        info!("用户上传图片已保存至临时文件: {}", path.display());

        Ok(StagedFile {
            path,
            released: false,
        })
    }
}

/// 已暂存的上传文件
///
/// 正常流程中由调用方显式 [`release`](StagedFile::release)；
/// 若所在的 future 被取消或 panic，则在 drop 时删除。
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    released: bool,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// 删除临时文件
    ///
    /// 只会尝试一次；文件已不存在视为成功，其他删除失败只记录日志。
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let result = fs::remove_file(&self.path).await;
        log_removal(&self.path, result);
    }

    fn release_blocking(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let result = std::fs::remove_file(&self.path);
        log_removal(&self.path, result);
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => debug!("已删除临时文件: {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("临时文件已不存在: {}", path.display())
        }
        Err(e) => warn!("删除临时文件失败 ({}): {}", path.display(), e),
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.release_blocking();
    }
}
