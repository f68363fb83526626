//! OCR 进程调用
//!
//! 每次请求启动一个 OCR 进程，参数按固定顺序传递：
//!
//! ```text
//! [解释器, 脚本, 输入图片, 题号, 结果文件, 答案图片?]
//! ```
//!
//! stdout 与 stderr 合并为一份输出，逐行读取直到 EOF，然后等待进程退出。
//! 非零退出码作为数据返回；只有启动失败、等待失败和超时才返回错误。

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ProcessError};

/// 被信号终止、没有退出码时使用的值
pub const SIGNALLED_EXIT_CODE: i32 = -1;

/// 完整的 OCR 进程命令行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    argv: Vec<OsString>,
}

impl WorkerCommand {
    /// 直接由参数列表构造，第一个元素为可执行文件
    pub fn from_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &OsStr {
        self.argv.first().map(OsString::as_os_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[OsString] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }
}

impl fmt::Display for WorkerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self.argv.iter().map(|a| a.to_string_lossy()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// 构建 OCR 进程命令行
///
/// `image_path` 只在需要截取答案区域图片时追加到末尾。
pub fn build_command(
    interpreter: &Path,
    script: &Path,
    input_path: &Path,
    question_id: &str,
    output_path: &Path,
    image_path: Option<&Path>,
) -> WorkerCommand {
    let mut argv: Vec<OsString> = vec![
        interpreter.into(),
        script.into(),
        input_path.into(),
        question_id.into(),
        output_path.into(),
    ];
    if let Some(image_path) = image_path {
        argv.push(image_path.into());
    }
    WorkerCommand { argv }
}

/// OCR 进程的原始结果
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    pub exit_code: i32,
    /// stdout 与 stderr 按到达顺序合并的输出
    pub output: String,
}

impl WorkerOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// OCR 进程调用器
pub struct WorkerInvoker {
    timeout: Duration,
}

impl WorkerInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Duration::from_secs(config.worker_timeout_secs))
    }

    /// 启动进程并等待结束
    ///
    /// 超时后进程会被强制终止，并返回 `AppError::Timeout`。
    pub async fn invoke(&self, command: &WorkerCommand) -> AppResult<WorkerOutput> {
        info!("执行命令: {}", command);

        let mut child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AppError::spawn_failed(command.program().to_string_lossy(), source))?;

        let stdout = child
            .stdout
            .take()
            .ok_or(ProcessError::StreamUnavailable("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ProcessError::StreamUnavailable("stderr"))?;

        // 两个读取任务共用一个通道，实现 stderr 合并到 stdout
        let (tx, rx) = mpsc::unbounded_channel();
        let readers = [
            spawn_line_forwarder(stdout, tx.clone()),
            spawn_line_forwarder(stderr, tx),
        ];

        let run = async {
            let output = collect_output(rx).await;
            let status = child.wait().await.map_err(ProcessError::WaitFailed)?;
            Ok::<_, AppError>((status, output))
        };
        let result = tokio::time::timeout(self.timeout, run).await;

        let (status, output) = match result {
            Ok(finished) => finished?,
            Err(_) => {
                for reader in &readers {
                    reader.abort();
                }
                if let Err(e) = child.kill().await {
                    warn!("终止超时的OCR进程失败: {}", e);
                }
                error!(
                    "OCR进程超过 {} 秒未结束，已终止: {}",
                    self.timeout.as_secs(),
                    command
                );
                return Err(AppError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let exit_code = status.code().unwrap_or_else(|| {
            warn!("OCR进程被信号终止: {}", status);
            SIGNALLED_EXIT_CODE
        });
        info!("OCR进程退出码: {}", exit_code);
        if exit_code != 0 {
            error!("OCR脚本执行失败，错误码: {}", exit_code);
        }

        Ok(WorkerOutput { exit_code, output })
    }
}

/// 逐行读取输出流并转发到通道，非 UTF-8 内容按有损方式解码
fn spawn_line_forwarder<R>(stream: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("读取OCR进程输出失败: {}", e);
                    break;
                }
            }
        }
    })
}

/// 收集所有输出行，直到两个输出流都结束
async fn collect_output(mut rx: mpsc::UnboundedReceiver<String>) -> String {
    let mut output = String::new();
    let mut lines = 0usize;

    while let Some(line) = rx.recv().await {
        info!("OCR输出: {}", line);
        output.push_str(&line);
        output.push('\n');
        lines += 1;
    }

    debug!("OCR进程输出结束，共 {} 行", lines);
    output
}
