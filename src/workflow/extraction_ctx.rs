//! 识别请求上下文
//!
//! 封装"正在为哪道题、在什么时刻生成哪些输出文件"这一信息

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::infrastructure::StorageLayout;
use crate::models::ExtractionMode;

/// 识别请求上下文
#[derive(Debug, Clone)]
pub struct ExtractionCtx {
    /// 题号
    pub question_id: String,

    /// 请求时间戳（毫秒），用于输出文件命名
    pub timestamp: i64,

    /// OCR 结果文件路径
    result_file: PathBuf,

    /// 答案区域图片路径（仅在需要图片时存在）
    answer_image_path: Option<PathBuf>,
}

impl ExtractionCtx {
    /// 以当前时间创建上下文
    pub fn new(question_id: &str, extension: &str, mode: ExtractionMode, layout: &StorageLayout) -> Self {
        Self::at(question_id, extension, mode, layout, next_timestamp())
    }

    /// 以指定时间戳创建上下文
    ///
    /// - 结果文件: `{result_dir}/ocr_result_{题号}_{时间戳}.txt`
    /// - 答案图片: `{result_dir}/answer_images/answer_{题号}_{时间戳}.{扩展名}`
    pub fn at(
        question_id: &str,
        extension: &str,
        mode: ExtractionMode,
        layout: &StorageLayout,
        timestamp: i64,
    ) -> Self {
        let result_file = layout
            .result_dir()
            .join(format!("ocr_result_{}_{}.txt", question_id, timestamp));

        let answer_image_path = mode.wants_image().then(|| {
            layout
                .answer_images_dir()
                .join(format!("answer_{}_{}.{}", question_id, timestamp, extension))
        });

        Self {
            question_id: question_id.to_string(),
            timestamp,
            result_file,
            answer_image_path,
        }
    }

    pub fn result_file(&self) -> &Path {
        &self.result_file
    }

    pub fn answer_image_path(&self) -> Option<&Path> {
        self.answer_image_path.as_deref()
    }
}

/// 进程内单调递增的毫秒时间戳
///
/// 同一毫秒内的并发请求依次顺延 1 毫秒，保证相同题号的输出文件名不冲突。
fn next_timestamp() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);

    let now = chrono::Local::now().timestamp_millis();
    let previous = LAST
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
        .unwrap_or_else(|last| last);
    now.max(previous + 1)
}

impl Display for ExtractionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题目 #{}]", self.question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths_follow_naming_convention() {
        let layout = StorageLayout::new("/srv/temp", "/srv/ocr_results");
        let ctx = ExtractionCtx::at("17", "png", ExtractionMode::AnswerWithImage, &layout, 1700000000000);

        assert_eq!(
            ctx.result_file(),
            Path::new("/srv/ocr_results/ocr_result_17_1700000000000.txt")
        );
        assert_eq!(
            ctx.answer_image_path(),
            Some(Path::new("/srv/ocr_results/answer_images/answer_17_1700000000000.png"))
        );
        assert_eq!(ctx.to_string(), "[题目 #17]");
    }

    #[test]
    fn test_answer_only_has_no_image_path() {
        let layout = StorageLayout::new("temp", "ocr_results");
        let ctx = ExtractionCtx::new("3", "jpg", ExtractionMode::AnswerOnly, &layout);

        assert!(ctx.answer_image_path().is_none());
        assert!(ctx.timestamp > 0);
    }

    #[test]
    fn test_timestamps_are_unique_within_process() {
        let layout = StorageLayout::new("temp", "ocr_results");
        let files: std::collections::HashSet<_> = (0..200)
            .map(|_| {
                ExtractionCtx::new("17", "png", ExtractionMode::AnswerOnly, &layout)
                    .result_file()
                    .to_path_buf()
            })
            .collect();

        assert_eq!(files.len(), 200);
    }
}
