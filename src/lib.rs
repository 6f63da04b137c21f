//! A memory-augmented, tool-calling chat agent.
//!
//! The crate wires a hosted Gemini chat model to four callable tools
//! (arithmetic, date math, live weather, text analysis) and a hosted
//! long-term memory service:
//! - A language model abstraction (`LanguageModel`) with a `GeminiClient`.
//! - A tool interface (`Tool` and `ToolRegistry`) plus the standard toolkit.
//! - An `Agent` that loops between the model and tools until a final answer.
//! - A `MemoryStore` abstraction with a Mem0 HTTP client for cross-session
//!   recall.

mod agent;
pub mod config;
mod error;
mod llm;
pub mod logging;
mod memory;
mod message;
pub mod prompt;
mod recall;
mod tool;
pub mod tools;

pub use agent::Agent;
pub use error::{MnemoError, Result};
pub use llm::{GeminiClient, LanguageModel, ModelCompletion, StubModel};
pub use memory::{ConversationMemory, WindowedContext};
pub use message::{Message, Role, ToolCall, ToolResult};
pub use recall::{InMemoryStore, Mem0Client, MemoryRecord, MemoryStore};
pub use tool::{Tool, ToolDescription, ToolRegistry};
