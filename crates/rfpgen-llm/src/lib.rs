//! Chat completion and embedding providers used for proposal drafting.

pub mod any;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;
pub mod retry;

pub use any::AnyProvider;
pub use error::LlmError;
pub use provider::{EmbedFuture, GenerationParams, LlmProvider, Message, Role, StatusTx};
pub use retry::RetryPolicy;
