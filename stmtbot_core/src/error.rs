use thiserror::Error;

/// Failure to consult the tabular store.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("tabular store unreachable: {0}")]
    Transport(String),

    #[error("tabular store rejected credentials: {0}")]
    Unauthorized(String),

    #[error("unexpected tabular store response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to read rows: {0}")]
    Source(#[from] LookupError),

    #[error("failed to render workbook: {0}")]
    Render(String),
}

/// Failures that abort a transition and force the conversation to end.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("delivery to {target} failed: {source}")]
    Delivery {
        target: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("session for {sender} has no {field}")]
    MissingField { sender: String, field: &'static str },
}
