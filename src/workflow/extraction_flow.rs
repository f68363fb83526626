//! 识别处理流程 - 流程层
//!
//! 核心职责：定义"一次识别请求"的完整处理流程
//!
//! 流程顺序：
//! 1. 确保目录存在
//! 2. 暂存上传图片
//! 3. 调用 OCR 进程（受并发上限与超时约束）
//! 4. 解析结果文件，检查答案图片
//! 5. 删除临时文件（无论成功、软失败还是出错都会执行）

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, ProcessError};
use crate::infrastructure::{build_command, StorageLayout, TempFileManager, WorkerInvoker};
use crate::models::{ExtractionMode, InvocationOutcome, UploadPayload};
use crate::services::{check_answer_image, ResultParser, ResultReader};
use crate::utils::logging::truncate_text;
use crate::workflow::extraction_ctx::ExtractionCtx;

/// 流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Init,
    DirectoriesEnsured,
    InputStaged,
    WorkerInvoked,
    ResultParsed,
    Cleaned,
}

/// OCR 进程非零退出时返回给调用方的提示
pub fn worker_failure_message(exit_code: i32) -> String {
    format!("OCR处理失败，错误码: {}", exit_code)
}

/// 识别处理流程
///
/// - 编排单次请求的完整流程
/// - 持有 OCR 进程并发许可，所有请求共用
/// - 不保存任何请求级别的状态
pub struct ExtractionFlow {
    python_path: PathBuf,
    ocr_script_path: PathBuf,
    layout: StorageLayout,
    temp_files: TempFileManager,
    invoker: WorkerInvoker,
    reader: ResultReader,
    worker_permits: Arc<Semaphore>,
    verbose_logging: bool,
}

impl ExtractionFlow {
    /// 创建新的识别流程，使用默认的 `答案:` 标记解析器
    pub fn new(config: &Config) -> Self {
        Self::with_reader(config, ResultReader::default())
    }

    /// 使用自定义结果解析器创建
    pub fn with_parser(config: &Config, parser: Arc<dyn ResultParser>) -> Self {
        Self::with_reader(config, ResultReader::new(parser))
    }

    fn with_reader(config: &Config, reader: ResultReader) -> Self {
        Self {
            python_path: config.python_path.clone(),
            ocr_script_path: config.ocr_script_path.clone(),
            layout: StorageLayout::from_config(config),
            temp_files: TempFileManager::new(&config.temp_dir),
            invoker: WorkerInvoker::from_config(config),
            reader,
            worker_permits: Arc::new(Semaphore::new(config.max_concurrent_workers)),
            verbose_logging: config.verbose_logging,
        }
    }

    /// 当前可用的 OCR 进程许可数量
    pub fn available_workers(&self) -> usize {
        self.worker_permits.available_permits()
    }

    pub async fn run(&self, payload: &UploadPayload, mode: ExtractionMode) -> AppResult<InvocationOutcome> {
        payload.validate_question_id()?;
        let extension = payload.extension()?;
        let ctx = ExtractionCtx::new(payload.question_id(), extension, mode, &self.layout);
        self.enter(&ctx, FlowStage::Init);

        self.layout.ensure_for(mode).await?;
        self.enter(&ctx, FlowStage::DirectoriesEnsured);

        let mut staged = self.temp_files.stage(payload).await?;
        self.enter(&ctx, FlowStage::InputStaged);

        // 临时文件在这里统一释放；若 future 被取消，StagedFile 的 drop 兜底
        let result = self.invoke_and_parse(&ctx, staged.path()).await;

        staged.release().await;
        self.enter(&ctx, FlowStage::Cleaned);

        result
    }

    async fn invoke_and_parse(&self, ctx: &ExtractionCtx, input_path: &Path) -> AppResult<InvocationOutcome> {
        let image_path = ctx.answer_image_path();
        let command = build_command(
            &self.python_path,
            &self.ocr_script_path,
            input_path,
            &ctx.question_id,
            ctx.result_file(),
            image_path,
        );

        let output = {
            let _permit = self
                .worker_permits
                .acquire()
                .await
                .map_err(|_| ProcessError::PoolClosed)?;
            self.invoker.invoke(&command).await?
        };
        self.enter(ctx, FlowStage::WorkerInvoked);

        if self.verbose_logging {
            debug!("{} OCR输出预览: {}", ctx, truncate_text(&output.output, 200));
        }

        if !output.succeeded() {
            warn!("{} OCR进程退出码 {}，不解析结果文件", ctx, output.exit_code);
            return Ok(InvocationOutcome {
                exit_code: output.exit_code,
                answer: worker_failure_message(output.exit_code),
                output: output.output,
                answer_image_path: None,
            });
        }

        let answer = self.reader.extract_answer(ctx.result_file()).await;
        info!("{} 识别答案: {}", ctx, answer);

        let mut answer_image_path = None;
        if let Some(path) = image_path {
            if check_answer_image(path).await {
                info!("{} 答案区域图片已保存: {}", ctx, path.display());
                answer_image_path = Some(path.to_path_buf());
            } else {
                warn!("{} 答案区域图片未生成: {}", ctx, path.display());
            }
        }
        self.enter(ctx, FlowStage::ResultParsed);

        Ok(InvocationOutcome {
            exit_code: output.exit_code,
            output: output.output,
            answer,
            answer_image_path,
        })
    }

    fn enter(&self, ctx: &ExtractionCtx, stage: FlowStage) {
        debug!("{} 进入阶段: {:?}", ctx, stage);
    }
}
