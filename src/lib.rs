//! # OCR Answer Extract
//!
//! 调用外部 OCR 进程，从上传的作业图片中提取指定题目答案的 Rust 库
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有文件系统与子进程资源，只暴露能力
//! - `StorageLayout` - 临时目录、结果目录、答案图片目录
//! - `TempFileManager` - 上传图片的暂存，`StagedFile` 保证删除
//! - `WorkerInvoker` - 启动 OCR 进程，合并输出，超时终止
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 解读 OCR 进程写出的文件
//! - `ResultParser` - `答案:` 标记协议
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次识别请求"的完整流程
//! - `ExtractionCtx` - 上下文封装（题号 + 时间戳 + 输出路径）
//! - `ExtractionFlow` - 流程编排（目录 → 暂存 → 进程 → 解析 → 清理）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/ocr_service` - 对外入口，校验配置，决定返回形状
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnswerWithImage, ExtractionMode, ExtractionOutcome, UploadPayload};
pub use orchestrator::OcrService;
pub use services::{ResultParser, NO_ANSWER_MESSAGE};
pub use workflow::{worker_failure_message, ExtractionFlow};
