// File: ./src/llm/mod.rs
//! Chat model abstraction used by the parse service.
pub mod openai;
pub mod prompt;

use anyhow::Result;
use futures::stream::BoxStream;
use std::future::Future;

pub use openai::OpenAiClient;

/// A system instruction plus the user's raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Ordered completion fragments. An `Err` item ends the stream.
pub type FragmentStream = BoxStream<'static, Result<String>>;

pub trait ChatModel: Send + Sync {
    /// Starts a streamed completion. Fragments are yielded as they arrive.
    fn stream(&self, prompt: &Prompt) -> impl Future<Output = Result<FragmentStream>> + Send;

    /// Runs a completion to the end and returns the whole text.
    fn invoke(&self, prompt: &Prompt) -> impl Future<Output = Result<String>> + Send;
}
