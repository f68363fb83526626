//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::OcrService (对外入口，校验配置)
//!     ↓
//! workflow::ExtractionFlow (处理单次请求)
//!     ↓
//! services (能力层：结果解析)
//!     ↓
//! infrastructure (基础设施：目录、临时文件、OCR 进程)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：OcrService 管入口与返回形状，ExtractionFlow 管流程
//! 2. **资源隔离**：请求之间只共享目录与进程并发许可
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod ocr_service;

pub use ocr_service::OcrService;
