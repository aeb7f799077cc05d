//! Service layer: the completion-service client and the endpoint operations
//! built on the pipeline.

pub mod analysis;
pub mod completion;

pub use analysis::AnalysisService;
pub use completion::{ChatCompletionClient, CompletionError, CompletionRequest, CompletionService};
