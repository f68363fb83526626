//! 基础设施层（Infrastructure Layer）
//!
//! 持有文件系统与子进程这类稀缺资源，只暴露能力，不认识题目或流程：
//!
//! - `storage` - 目录命名空间（临时目录、结果目录、答案图片目录）
//! - `temp_file` - 上传文件的暂存与清理
//! - `worker_invoker` - 启动 OCR 进程并收集输出

pub mod storage;
pub mod temp_file;
pub mod worker_invoker;

pub use storage::{ensure_directory, StorageLayout};
pub use temp_file::{StagedFile, TempFileManager};
pub use worker_invoker::{build_command, WorkerCommand, WorkerInvoker, WorkerOutput};
