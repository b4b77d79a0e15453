//! Answer generation with LLM and citation handling

pub mod chain;
pub mod citation;
pub mod prompt;

pub use chain::RagChain;
pub use citation::{build_citations, cited_pages};
pub use prompt::PromptBuilder;
