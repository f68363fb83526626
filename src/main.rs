//! ocr-answer - 从作业图片中提取指定题目的答案
//!
//! Usage:
//!   ocr-answer <IMAGE> <QUESTION_ID> [--with-image] [--config <FILE>]
//!
//! 未指定 `--config` 时从环境变量读取配置（OCR_PYTHON_PATH、OCR_SCRIPT_PATH 等）。

use anyhow::{Context, Result};
use clap::Parser;
use ocr_answer_extract::utils::logging;
use ocr_answer_extract::{Config, ExtractionMode, OcrService, UploadPayload};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ocr-answer")]
#[command(about = "调用 OCR 进程，从作业图片中提取指定题目的答案")]
#[command(version)]
struct Cli {
    /// 作业图片路径
    image: PathBuf,

    /// 题号
    question_id: String,

    /// 同时截取答案区域图片
    #[arg(long)]
    with_image: bool,

    /// TOML 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    let service = OcrService::new(config)?;

    let content = tokio::fs::read(&cli.image)
        .await
        .with_context(|| format!("无法读取图片: {}", cli.image.display()))?;
    let filename = cli
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let payload = UploadPayload::new(content, filename, cli.question_id);

    let mode = if cli.with_image {
        ExtractionMode::AnswerWithImage
    } else {
        ExtractionMode::AnswerOnly
    };

    let outcome = service.extract(&payload, mode).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
