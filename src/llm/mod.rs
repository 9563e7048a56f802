mod client;
mod types;

pub use client::{ChatStream, LlmClient, OpenAiClient};
pub use types::*;
