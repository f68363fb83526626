//! 目录命名空间管理

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppResult, StorageError};
use crate::models::ExtractionMode;

/// 答案区域图片子目录名
pub const ANSWER_IMAGES_DIR: &str = "answer_images";

/// 确保目录存在（包括父目录）
///
/// 目录已存在时直接返回；路径被普通文件占用或无权创建时返回 `StorageError`。
/// 并发调用是安全的。
pub async fn ensure_directory(path: &Path) -> AppResult<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(StorageError::NotADirectory {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StorageError::CreateDirFailed {
                path: path.to_path_buf(),
                source,
            }
            .into())
        }
    }

    // create_dir_all 在目录已被其他请求创建时同样返回 Ok
    fs::create_dir_all(path)
        .await
        .map_err(|source| StorageError::CreateDirFailed {
            path: path.to_path_buf(),
            source,
        })?;

    debug!("已创建目录: {}", path.display());
    Ok(())
}

/// 三个命名空间的布局
#[derive(Debug, Clone)]
pub struct StorageLayout {
    temp_dir: PathBuf,
    result_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(temp_dir: impl Into<PathBuf>, result_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            result_dir: result_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.temp_dir, &config.result_dir)
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    pub fn answer_images_dir(&self) -> PathBuf {
        self.result_dir.join(ANSWER_IMAGES_DIR)
    }

    /// 确保指定模式需要的目录全部存在
    pub async fn ensure_for(&self, mode: ExtractionMode) -> AppResult<()> {
        ensure_directory(&self.temp_dir).await?;
        ensure_directory(&self.result_dir).await?;
        if mode.wants_image() {
            ensure_directory(&self.answer_images_dir()).await?;
        }
        Ok(())
    }
}
