pub mod outcome;
pub mod upload;

pub use outcome::{AnswerWithImage, ExtractionMode, ExtractionOutcome, InvocationOutcome};
pub use upload::UploadPayload;
