// Reasoning oracle integration

pub mod client;
pub mod http;
pub mod prompt;
pub mod retry;

pub use client::{OracleError, OracleRequest, ReasoningOracle};
pub use http::HttpOracleClient;
pub use prompt::build_assessment_prompt;
pub use retry::{complete_with_retry, RetryPolicy};
