//! 业务能力层（Services）
//!
//! 只负责解读 OCR 进程写出的文件，不关心流程。

pub mod result_parser;

pub use result_parser::{
    check_answer_image, MarkerResultParser, ResultParser, ResultReader, ANSWER_MARKER,
    NO_ANSWER_MESSAGE,
};
