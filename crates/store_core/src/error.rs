use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reaction for action \"{action}\" failed: {source}")]
    Reaction {
        action: String,
        source: anyhow::Error,
    },
    #[error("invalid payload for action \"{action}\": {source}")]
    InvalidPayload {
        action: String,
        source: serde_json::Error,
    },
    #[error("failed to serialize state value for key \"{key}\": {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
    #[error("state patch must be a JSON object, got {found}")]
    PatchNotObject { found: &'static str },
    #[error("no async runtime available to schedule deferred work for action \"{action}\"")]
    NoRuntime { action: String },
    #[error("deferred task for action \"{action}\" failed: {source}")]
    Deferred {
        action: String,
        source: anyhow::Error,
    },
    #[error("deferred task for action \"{action}\" panicked")]
    TaskPanicked { action: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
