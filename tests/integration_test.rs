//! 端到端测试：用 `/bin/sh` 脚本模拟 OCR 进程
//!
//! 模拟脚本收到的参数与真实 OCR 脚本一致：
//! `$1` 输入图片，`$2` 题号，`$3` 结果文件，`$4` 答案图片（可选）

#![cfg(unix)]

use futures::future::join_all;
use ocr_answer_extract::error::{AppError, ProcessError, ValidationError};
use ocr_answer_extract::{
    worker_failure_message, Config, ExtractionMode, ExtractionOutcome, OcrService, ResultParser,
    UploadPayload, NO_ANSWER_MESSAGE,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

struct Fixture {
    _dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new(script_body: &str) -> Self {
        let dir = TempDir::new().expect("创建临时目录失败");
        let script = dir.path().join("fake_ocr.sh");
        std::fs::write(&script, script_body).expect("写入模拟脚本失败");

        let config = Config {
            python_path: PathBuf::from("/bin/sh"),
            ocr_script_path: script,
            temp_dir: dir.path().join("temp"),
            result_dir: dir.path().join("ocr_results"),
            max_concurrent_workers: 2,
            worker_timeout_secs: 10,
            verbose_logging: true,
        };

        Self { _dir: dir, config }
    }

    fn service(&self) -> OcrService {
        OcrService::new(self.config.clone()).expect("创建服务失败")
    }

    fn staged_file_count(&self) -> usize {
        count_entries(&self.config.temp_dir)
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

fn payload(question_id: &str) -> UploadPayload {
    UploadPayload::new(b"\x89PNG fake".to_vec(), "homework.png", question_id)
}

const ANSWER_42: &str = r#"
echo "正在识别: $1"
echo "调试信息" >&2
printf '题号: %s\n识别文本: 略\n答案: 42\n答案: 43\n' "$2" > "$3"
"#;

#[tokio::test]
async fn test_answer_only_returns_marker_answer() {
    ocr_answer_extract::utils::logging::init(true);
    let fixture = Fixture::new(ANSWER_42);
    let service = fixture.service();

    let answer = assert_ok!(service.extract_answer(&payload("17")).await);

    assert_eq!(answer, "42");
    assert_eq!(fixture.staged_file_count(), 0);

    // 结果文件保留，不由本系统删除
    let results: Vec<_> = std::fs::read_dir(&fixture.config.result_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].starts_with("ocr_result_17_"));
    assert!(results[0].ends_with(".txt"));
}

#[tokio::test]
async fn test_missing_marker_returns_fallback() {
    let fixture = Fixture::new("printf '题号: %s\\n识别文本: x\\n' \"$2\" > \"$3\"\n");
    let service = fixture.service();

    let answer = assert_ok!(service.extract_answer(&payload("5")).await);

    assert_eq!(answer, NO_ANSWER_MESSAGE);
    assert_eq!(fixture.staged_file_count(), 0);
}

#[tokio::test]
async fn test_missing_result_file_returns_fallback() {
    let fixture = Fixture::new("echo 没有写结果文件\n");
    let service = fixture.service();

    let answer = assert_ok!(service.extract_answer(&payload("5")).await);

    assert_eq!(answer, NO_ANSWER_MESSAGE);
}

#[tokio::test]
async fn test_non_zero_exit_is_soft_failure() {
    let fixture = Fixture::new("echo 模型加载失败 >&2\nexit 7\n");
    let service = fixture.service();

    let answer = assert_ok!(service.extract_answer(&payload("9")).await);

    assert!(answer.contains('7'));
    assert_eq!(answer, worker_failure_message(7));
    assert_eq!(fixture.staged_file_count(), 0);
}

#[tokio::test]
async fn test_non_zero_exit_with_image_has_no_image() {
    let fixture = Fixture::new("printf '答案: 1\\n' > \"$3\"\ncp \"$1\" \"$4\"\nexit 3\n");
    let service = fixture.service();

    let record = assert_ok!(service.extract_answer_and_image(&payload("9")).await);

    assert_eq!(record.answer, worker_failure_message(3));
    assert_eq!(record.answer_image_path, None);
}

#[tokio::test]
async fn test_answer_with_generated_image() {
    let fixture = Fixture::new("printf '答案: B\\n' > \"$3\"\ncp \"$1\" \"$4\"\n");
    let service = fixture.service();

    let record = assert_ok!(service.extract_answer_and_image(&payload("17")).await);

    assert_eq!(record.answer, "B");
    let image = record.answer_image_path.expect("应该返回答案图片路径");
    assert!(image.exists());
    assert_eq!(
        image.parent(),
        Some(fixture.config.result_dir.join("answer_images").as_path())
    );
    let name = image.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("answer_17_"));
    assert!(name.ends_with(".png"));
    assert_eq!(std::fs::read(&image).unwrap(), b"\x89PNG fake");
    assert_eq!(fixture.staged_file_count(), 0);
}

#[tokio::test]
async fn test_answer_without_generated_image() {
    let fixture = Fixture::new(ANSWER_42);
    let service = fixture.service();

    let outcome = assert_ok!(
        service
            .extract(&payload("17"), ExtractionMode::AnswerWithImage)
            .await
    );

    match outcome {
        ExtractionOutcome::WithImage(record) => {
            assert_eq!(record.answer, "42");
            assert_eq!(record.answer_image_path, None);
        }
        other => panic!("期望带图片的结果，实际为 {:?}", other),
    }
}

#[tokio::test]
async fn test_worker_receives_no_image_argument_in_answer_only_mode() {
    let fixture = Fixture::new("printf '答案: %s\\n' \"$#\" > \"$3\"\n");
    let service = fixture.service();

    let answer_only = assert_ok!(service.extract_answer(&payload("1")).await);
    let with_image = assert_ok!(service.extract_answer_and_image(&payload("1")).await);

    // 脚本本身不计入 $#：输入、题号、结果文件 [, 答案图片]
    assert_eq!(answer_only, "3");
    assert_eq!(with_image.answer, "4");
}

#[tokio::test]
async fn test_spawn_failure_is_hard_error_and_cleans_up() {
    let mut fixture = Fixture::new(ANSWER_42);
    fixture.config.python_path = PathBuf::from("ocr-interpreter-that-does-not-exist");
    let service = fixture.service();

    let err = assert_err!(service.extract_answer(&payload("17")).await);

    assert!(matches!(
        err,
        AppError::Process(ProcessError::SpawnFailed { .. })
    ));
    assert_eq!(fixture.staged_file_count(), 0);
}

#[tokio::test]
async fn test_timeout_kills_worker_and_cleans_up() {
    let mut fixture = Fixture::new("exec sleep 30\n");
    fixture.config.worker_timeout_secs = 1;
    let service = fixture.service();

    let started = std::time::Instant::now();
    let err = assert_err!(service.extract_answer_and_image(&payload("17")).await);

    assert!(err.is_timeout());
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(fixture.staged_file_count(), 0);
}

#[tokio::test]
async fn test_missing_extension_aborts_before_invocation() {
    let fixture = Fixture::new("touch \"$3.invoked\"\nprintf '答案: 1\\n' > \"$3\"\n");
    let service = fixture.service();
    let upload = UploadPayload::new(b"x".to_vec(), "homework", "17");

    let err = assert_err!(service.extract_answer(&upload).await);

    assert!(matches!(
        err,
        AppError::Validation(ValidationError::MissingExtension { .. })
    ));
    assert_eq!(fixture.staged_file_count(), 0);
    assert_eq!(count_entries(&fixture.config.result_dir), 0);
}

#[test]
fn test_invalid_config_fails_fast() {
    let mut fixture = Fixture::new(ANSWER_42);
    fixture.config.ocr_script_path = PathBuf::from("/nonexistent/ocr_tool.py");

    let err = OcrService::new(fixture.config.clone())
        .err()
        .expect("脚本不存在时应该启动失败");
    assert!(matches!(err, AppError::Config(_)));
}

#[tokio::test]
async fn test_concurrent_requests_with_same_question_id() {
    // 答案为暂存文件名，用来确认每个请求拿到的都是自己的文件
    let fixture = Fixture::new("sleep 0.1\nprintf '答案: %s\\n' \"$(basename \"$1\")\" > \"$3\"\n");
    let service = fixture.service();
    let uploads: Vec<_> = (0..8).map(|_| payload("17")).collect();

    let results = join_all(uploads.iter().map(|upload| service.extract_answer(upload))).await;

    let answers: HashSet<String> = results
        .into_iter()
        .map(|r| r.expect("请求应该成功"))
        .collect();
    assert_eq!(answers.len(), 8);
    assert!(answers.iter().all(|name| name.ends_with(".png")));
    assert_eq!(fixture.staged_file_count(), 0);
    assert_eq!(count_entries(&fixture.config.result_dir), 8);
}

#[tokio::test]
async fn test_live_workers_never_exceed_limit() {
    // 每个进程在 live/ 下登记自己的 pid，记录登记时的在跑数量
    let fixture = Fixture::new(
        r#"
base="$(dirname "$3")/.."
mkdir -p "$base/live"
touch "$base/live/$$"
ls "$base/live" | wc -l >> "$base/peaks.log"
sleep 0.3
rm -f "$base/live/$$"
printf '答案: ok\n' > "$3"
"#,
    );
    assert_eq!(fixture.config.max_concurrent_workers, 2);
    let service = fixture.service();
    let uploads: Vec<_> = (0..8).map(|i| payload(&i.to_string())).collect();

    let results = join_all(uploads.iter().map(|upload| service.extract_answer(upload))).await;
    assert!(results.iter().all(|r| matches!(r, Ok(answer) if answer == "ok")));

    let peaks_file = fixture.config.result_dir.join("..").join("peaks.log");
    let peaks: Vec<usize> = std::fs::read_to_string(&peaks_file)
        .expect("应该记录在跑进程数")
        .lines()
        .map(|line| line.trim().parse().expect("记录应为数字"))
        .collect();
    assert_eq!(peaks.len(), 8);
    let peak = peaks.iter().copied().max().unwrap();
    assert!((1..=2).contains(&peak), "同时在跑的进程数为 {}", peak);
}

/// 读取 `ANSWER=` 行的解析器
struct KeyValueParser;

impl ResultParser for KeyValueParser {
    fn parse(&self, content: &str) -> Option<String> {
        content
            .lines()
            .find_map(|line| line.strip_prefix("ANSWER="))
            .map(|answer| answer.trim().to_string())
    }
}

#[tokio::test]
async fn test_custom_parser_replaces_marker_protocol() {
    let fixture = Fixture::new("printf '答案: 42\\nANSWER=C\\n' > \"$3\"\n");
    let service = assert_ok!(OcrService::with_parser(
        fixture.config.clone(),
        Arc::new(KeyValueParser)
    ));

    let answer = assert_ok!(service.extract_answer(&payload("17")).await);

    assert_eq!(answer, "C");
    assert_eq!(fixture.staged_file_count(), 0);
}
