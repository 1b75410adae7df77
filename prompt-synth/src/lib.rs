//! Prompt synthesis for per-function test generation.
//!
//! A [`PromptRequest`] pairs a function's code context (its class for
//! methods) with an optional documentation excerpt and the instruction of one
//! [`TestCategory`]; [`PromptBatch`] builds them for a whole repository.

pub mod batch;
pub mod category;
pub mod errors;
pub mod prompt;

pub use batch::{DEFAULT_MAX_MODULES, PromptBatch, PromptRecord};
pub use category::{TestCategory, instruction_for_label};
pub use errors::{PromptError, Result};
pub use prompt::{
    CodeContext, ContextSource, PromptRequest, build_prompt, code_context, missing_code_placeholder,
};
