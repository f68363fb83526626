pub mod extraction_ctx;
pub mod extraction_flow;

pub use extraction_ctx::ExtractionCtx;
pub use extraction_flow::{worker_failure_message, ExtractionFlow, FlowStage};
