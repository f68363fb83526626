//! 识别结果

use serde::Serialize;
use std::path::PathBuf;

/// 识别模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// 只提取答案文本
    AnswerOnly,
    /// 提取答案文本并截取答案区域图片
    AnswerWithImage,
}

impl ExtractionMode {
    pub fn wants_image(self) -> bool {
        matches!(self, ExtractionMode::AnswerWithImage)
    }
}

/// 一次 OCR 进程调用的完整结果
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    /// 进程退出码；被信号终止时为 -1
    pub exit_code: i32,
    /// stdout 与 stderr 合并后的输出，仅用于诊断
    pub output: String,
    /// 解析出的答案；失败时为提示文本
    pub answer: String,
    /// 已生成的答案区域图片
    pub answer_image_path: Option<PathBuf>,
}

/// 答案文本与答案区域图片
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerWithImage {
    pub answer: String,
    pub answer_image_path: Option<PathBuf>,
}

/// 返回给调用方的结果，形状由 [`ExtractionMode`] 决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    AnswerOnly { answer: String },
    WithImage(AnswerWithImage),
}

impl ExtractionOutcome {
    pub fn from_invocation(mode: ExtractionMode, outcome: InvocationOutcome) -> Self {
        match mode {
            ExtractionMode::AnswerOnly => ExtractionOutcome::AnswerOnly {
                answer: outcome.answer,
            },
            ExtractionMode::AnswerWithImage => ExtractionOutcome::WithImage(AnswerWithImage {
                answer: outcome.answer,
                answer_image_path: outcome.answer_image_path,
            }),
        }
    }

    pub fn answer(&self) -> &str {
        match self {
            ExtractionOutcome::AnswerOnly { answer } => answer,
            ExtractionOutcome::WithImage(record) => &record.answer,
        }
    }

    pub fn into_answer(self) -> String {
        match self {
            ExtractionOutcome::AnswerOnly { answer } => answer,
            ExtractionOutcome::WithImage(record) => record.answer,
        }
    }

    /// 转换为带图片的记录；只提取答案时图片字段为空
    pub fn into_record(self) -> AnswerWithImage {
        match self {
            ExtractionOutcome::AnswerOnly { answer } => AnswerWithImage {
                answer,
                answer_image_path: None,
            },
            ExtractionOutcome::WithImage(record) => record,
        }
    }
}
