//! 上传数据

use std::path::Path;

use crate::error::{AppResult, ValidationError};

/// 一次识别请求的上传内容
///
/// 创建后不可变；文件名只用于提供扩展名，题号只用于命名输出文件。
#[derive(Debug, Clone)]
pub struct UploadPayload {
    content: Vec<u8>,
    original_filename: String,
    question_id: String,
}

impl UploadPayload {
    pub fn new(
        content: impl Into<Vec<u8>>,
        original_filename: impl Into<String>,
        question_id: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            original_filename: original_filename.into(),
            question_id: question_id.into(),
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    /// 提取原始文件名的扩展名（不含点）
    ///
    /// `"scan.PNG"` → `"PNG"`；`"scan"`、`"scan."`、`".png"` 都视为没有扩展名。
    pub fn extension(&self) -> AppResult<&str> {
        Path::new(&self.original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| {
                ValidationError::MissingExtension {
                    filename: self.original_filename.clone(),
                }
                .into()
            })
    }

    /// 校验题号能安全地用于文件命名
    pub fn validate_question_id(&self) -> AppResult<()> {
        let id = self.question_id.as_str();
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyQuestionId.into());
        }
        if id.contains(['/', '\\', '\0']) || id == "." || id == ".." {
            return Err(ValidationError::IllegalQuestionId {
                question_id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}
