//! OCR 结果解析 - 业务能力层
//!
//! OCR 进程把识别结果写入一个按行组织的 UTF-8 文本文件，
//! 其中只有第一行以 `答案:` 开头的内容对本系统有意义，其余行一律忽略。
//! 标记协议封装在 [`ResultParser`] 之后，编排层不直接接触文件格式。

use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};

/// 答案行标记
pub const ANSWER_MARKER: &str = "答案:";

/// 无法提取答案时返回的提示
pub const NO_ANSWER_MESSAGE: &str = "无法从OCR结果中提取答案，请检查图片质量或OCR配置";

/// 结果文件内容解析
pub trait ResultParser: Send + Sync {
    /// 从结果文件内容中提取答案，没有答案时返回 `None`
    fn parse(&self, content: &str) -> Option<String>;
}

/// 按行前缀标记提取答案
#[derive(Debug, Clone)]
pub struct MarkerResultParser {
    marker: String,
}

impl MarkerResultParser {
    pub fn new() -> Self {
        Self::with_marker(ANSWER_MARKER)
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for MarkerResultParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultParser for MarkerResultParser {
    fn parse(&self, content: &str) -> Option<String> {
        content
            .lines()
            .find_map(|line| line.strip_prefix(self.marker.as_str()))
            .map(|rest| rest.trim().to_string())
    }
}

/// 结果文件读取
///
/// 文件不存在、无法读取或没有答案行都不算错误，统一返回 [`NO_ANSWER_MESSAGE`]。
#[derive(Clone)]
pub struct ResultReader {
    parser: Arc<dyn ResultParser>,
}

impl ResultReader {
    pub fn new(parser: Arc<dyn ResultParser>) -> Self {
        Self { parser }
    }

    /// 读取结果文件并提取答案
    pub async fn extract_answer(&self, result_file: &Path) -> String {
        self.read_answer(result_file)
            .await
            .unwrap_or_else(|| NO_ANSWER_MESSAGE.to_string())
    }

    async fn read_answer(&self, result_file: &Path) -> Option<String> {
        let content = match fs::read_to_string(result_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!("OCR结果文件不存在: {}", result_file.display());
                return None;
            }
            Err(e) => {
                error!("读取OCR结果文件失败 ({}): {}", result_file.display(), e);
                return None;
            }
        };

        let answer = self.parser.parse(&content);
        match &answer {
            Some(answer) => info!("从文件中提取的OCR答案: {}", answer),
            None => warn!("OCR结果文件中没有答案行: {}", result_file.display()),
        }
        answer
    }
}

impl Default for ResultReader {
    fn default() -> Self {
        Self::new(Arc::new(MarkerResultParser::new()))
    }
}

/// 检查答案区域图片是否已生成，只判断是否存在
pub async fn check_answer_image(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}
