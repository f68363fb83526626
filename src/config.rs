//! 程序配置
//!
//! 所有路径都从外部注入（环境变量或 TOML 文件），不在代码中写死。
//! 启动时调用 [`Config::validate`]，任何路径无效都会立即失败。

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Python 解释器路径（或 PATH 中的命令名）
    pub python_path: PathBuf,
    /// OCR 识别脚本路径
    pub ocr_script_path: PathBuf,
    /// 上传图片的临时目录
    pub temp_dir: PathBuf,
    /// OCR 结果输出目录
    pub result_dir: PathBuf,
    /// 同时运行的 OCR 进程数量上限
    pub max_concurrent_workers: usize,
    /// 单次 OCR 进程的超时时间（秒）
    pub worker_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            python_path: PathBuf::from("python3"),
            ocr_script_path: PathBuf::from("scripts/ocr_tool.py"),
            temp_dir: PathBuf::from("temp"),
            result_dir: PathBuf::from("ocr_results"),
            max_concurrent_workers: 4,
            worker_timeout_secs: 120,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            python_path: std::env::var("OCR_PYTHON_PATH").map(PathBuf::from).unwrap_or(default.python_path),
            ocr_script_path: std::env::var("OCR_SCRIPT_PATH").map(PathBuf::from).unwrap_or(default.ocr_script_path),
            temp_dir: std::env::var("OCR_TEMP_DIR").map(PathBuf::from).unwrap_or(default.temp_dir),
            result_dir: std::env::var("OCR_RESULT_DIR").map(PathBuf::from).unwrap_or(default.result_dir),
            max_concurrent_workers: std::env::var("OCR_MAX_CONCURRENT_WORKERS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_workers),
            worker_timeout_secs: std::env::var("OCR_WORKER_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.worker_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文件加载配置，缺失的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }

    /// 校验配置
    ///
    /// - 脚本必须是已存在的文件
    /// - 解释器若以路径形式给出则必须存在；纯命令名交给 PATH 解析
    /// - 临时目录与结果目录不能为空，且不能是已存在的普通文件
    /// - 并发数与超时时间必须大于 0
    pub fn validate(&self) -> AppResult<()> {
        if !self.ocr_script_path.is_file() {
            return Err(invalid_path("ocr_script_path", &self.ocr_script_path, "OCR脚本文件不存在").into());
        }

        if self.python_path.as_os_str().is_empty() {
            return Err(invalid_path("python_path", &self.python_path, "解释器路径为空").into());
        }
        if self.python_path.components().count() > 1 && !self.python_path.exists() {
            return Err(invalid_path("python_path", &self.python_path, "解释器不存在").into());
        }

        for (field, dir) in [("temp_dir", &self.temp_dir), ("result_dir", &self.result_dir)] {
            if dir.as_os_str().is_empty() {
                return Err(invalid_path(field, dir, "目录路径为空").into());
            }
            if dir.exists() && !dir.is_dir() {
                return Err(invalid_path(field, dir, "路径已存在且不是目录").into());
            }
        }

        if self.max_concurrent_workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_workers",
                reason: "必须大于 0".to_string(),
            }
            .into());
        }
        if self.worker_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker_timeout_secs",
                reason: "必须大于 0".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

fn invalid_path(field: &'static str, path: &Path, reason: &str) -> ConfigError {
    ConfigError::InvalidPath {
        field,
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let script = dir.path().join("ocr_tool.py");
        std::fs::write(&script, "print('ok')\n").unwrap();
        Config {
            python_path: PathBuf::from("python3"),
            ocr_script_path: script,
            temp_dir: dir.path().join("temp"),
            result_dir: dir.path().join("ocr_results"),
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let dir = TempDir::new().unwrap();
        assert!(config_in(&dir).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_script() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.ocr_script_path = dir.path().join("missing.py");

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::InvalidPath { field: "ocr_script_path", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_interpreter_path() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.python_path = dir.path().join("bin").join("python");

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_file_as_result_dir() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, "x").unwrap();
        config.result_dir = file;

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::InvalidPath { field: "result_dir", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.max_concurrent_workers = 0;
        assert!(config.validate().is_err());

        let mut config = config_in(&dir);
        config.worker_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ocr.toml");
        std::fs::write(
            &path,
            "python_path = \"/usr/bin/python3\"\nworker_timeout_secs = 15\n",
        )
        .unwrap();

        let config = Config::from_toml_file(&path).unwrap();
        assert_eq!(config.python_path, PathBuf::from("/usr/bin/python3"));
        assert_eq!(config.worker_timeout_secs, 15);
        assert_eq!(config.max_concurrent_workers, Config::default().max_concurrent_workers);
        assert_eq!(config.result_dir, PathBuf::from("ocr_results"));
    }

    #[test]
    fn test_from_toml_file_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "worker_timeout_secs = \"soon\"\n").unwrap();

        let err = Config::from_toml_file(&path).unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::TomlParseFailed { .. })
        ));
    }
}
