use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
///
/// 只有基础设施级别的故障（无法写入、无法启动进程、超时）才会以错误返回；
/// 进程非零退出码、结果文件缺失等情况作为数据返回，不经过这里。
#[derive(Debug, Error)]
pub enum AppError {
    /// 上传参数校验错误
    #[error("参数校验失败: {0}")]
    Validation(#[from] ValidationError),
    /// 目录或文件存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// OCR 进程错误
    #[error("进程错误: {0}")]
    Process(#[from] ProcessError),
    /// OCR 进程超过时限，已被终止
    #[error("OCR进程执行超时 ({timeout_secs} 秒)，进程已终止")]
    Timeout { timeout_secs: u64 },
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 上传参数校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 文件名没有扩展名
    #[error("上传文件缺少扩展名: {filename:?}")]
    MissingExtension { filename: String },
    /// 题号为空
    #[error("题号不能为空")]
    EmptyQuestionId,
    /// 题号包含路径字符，无法用于文件命名
    #[error("题号包含非法字符: {question_id:?}")]
    IllegalQuestionId { question_id: String },
}

/// 目录或文件存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 路径已存在但不是目录
    #[error("路径已存在且不是目录: {}", .path.display())]
    NotADirectory { path: PathBuf },
    /// 创建目录失败
    #[error("创建目录失败 ({}): {source}", .path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// 写入临时文件失败
    #[error("写入文件失败 ({}): {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// OCR 进程错误
#[derive(Debug, Error)]
pub enum ProcessError {
    /// 启动进程失败（可执行文件不存在、无权限等）
    #[error("无法启动OCR进程 ({program}): {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },
    /// 进程输出流未被捕获
    #[error("OCR进程的 {0} 未被捕获")]
    StreamUnavailable(&'static str),
    /// 等待进程结束失败
    #[error("等待OCR进程结束失败: {0}")]
    WaitFailed(#[source] io::Error),
    /// 并发控制已关闭
    #[error("OCR进程池已关闭")]
    PoolClosed,
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 路径配置无效
    #[error("配置项 {field} 无效 ({}): {reason}", .path.display())]
    InvalidPath {
        field: &'static str,
        path: PathBuf,
        reason: String,
    },
    /// 数值配置无效
    #[error("配置项 {field} 无效: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// TOML 解析失败
    #[error("配置文件解析失败 ({}): {source}", .path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建进程启动失败错误
    pub fn spawn_failed(program: impl Into<String>, source: io::Error) -> Self {
        AppError::Process(ProcessError::SpawnFailed {
            program: program.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AppError::Storage(StorageError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
