use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Bridge not ready: {0}")]
    NotReady(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Process terminated: {0}")]
    ProcessTerminated(String),

    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tool error: {0}")]
    Tool(String),
}

pub type Result<T> = std::result::Result<T, Error>;
