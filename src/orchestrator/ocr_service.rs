//! OCR 识别服务 - 编排层
//!
//! ## 职责
//!
//! 对外提供识别入口，是上层（HTTP 控制器等）唯一需要接触的类型。
//!
//! ## 核心功能
//!
//! 1. **启动校验**：创建时校验配置，路径无效立即失败
//! 2. **统一入口**：`extract` 按 [`ExtractionMode`] 选择返回形状
//! 3. **兼容入口**：`extract_answer` 只返回答案文本，
//!    `extract_answer_and_image` 返回答案与答案图片
//!
//! 软失败（进程非零退出、结果文件缺少答案）以文本形式返回，
//! 只有校验、存储、进程启动和超时问题才返回错误。

use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{AnswerWithImage, ExtractionMode, ExtractionOutcome, UploadPayload};
use crate::services::ResultParser;
use crate::workflow::ExtractionFlow;

/// OCR 识别服务
pub struct OcrService {
    flow: ExtractionFlow,
}

impl OcrService {
    /// 校验配置并创建服务
    pub fn new(config: Config) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);

        let flow = ExtractionFlow::new(&config);
        Ok(Self { flow })
    }

    /// 使用自定义结果解析器创建服务
    pub fn with_parser(config: Config, parser: Arc<dyn ResultParser>) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);

        let flow = ExtractionFlow::with_parser(&config, parser);
        Ok(Self { flow })
    }

    /// 识别一次上传
    pub async fn extract(&self, payload: &UploadPayload, mode: ExtractionMode) -> AppResult<ExtractionOutcome> {
        info!(
            "📥 收到识别请求: 题号 {} | 文件 {} | {} 字节",
            payload.question_id(),
            payload.original_filename(),
            payload.content().len()
        );

        match self.flow.run(payload, mode).await {
            Ok(outcome) => Ok(ExtractionOutcome::from_invocation(mode, outcome)),
            Err(e) => {
                error!("[题目 #{}] ❌ 识别失败: {}", payload.question_id(), e);
                Err(e)
            }
        }
    }

    /// 从图片中提取答案
    pub async fn extract_answer(&self, payload: &UploadPayload) -> AppResult<String> {
        self.extract(payload, ExtractionMode::AnswerOnly)
            .await
            .map(ExtractionOutcome::into_answer)
    }

    /// 从图片中提取答案文本和答案区域图片
    pub async fn extract_answer_and_image(&self, payload: &UploadPayload) -> AppResult<AnswerWithImage> {
        self.extract(payload, ExtractionMode::AnswerWithImage)
            .await
            .map(ExtractionOutcome::into_record)
    }
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 OCR识别服务启动");
    info!("🐍 解释器: {}", config.python_path.display());
    info!("📜 脚本: {}", config.ocr_script_path.display());
    info!("📊 最大并发进程数: {}", config.max_concurrent_workers);
    info!("⏱️ 进程超时: {} 秒", config.worker_timeout_secs);
    info!("{}", "=".repeat(60));
}
