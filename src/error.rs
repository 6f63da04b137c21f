use thiserror::Error;

pub type Result<T> = std::result::Result<T, MnemoError>;

#[derive(Debug, Error)]
pub enum MnemoError {
    #[error("missing credential: {0}")]
    Credential(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("language model error: {0}")]
    LanguageModel(String),

    #[error("memory service error: {0}")]
    Memory(String),

    #[error("tool `{0}` not found")]
    ToolNotFound(String),

    #[error("tool `{name}` invocation failed: {source}")]
    ToolInvocation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("agent error: {0}")]
    Agent(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
