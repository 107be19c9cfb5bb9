use serde::Deserialize;
use serde_json::Value;

/// Path of the analyze endpoint relative to the API base.
pub const ANALYZE_PATH: &str = "modules/chat-with-data/analyze";

pub const FIELD_QUESTION: &str = "question";
pub const FIELD_MODE: &str = "mode";
pub const FIELD_FILE: &str = "file";

/// Line prefix that marks a frame carrying payload.
pub const FRAME_PREFIX: &str = "data: ";

/// Payload that terminates the response stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded `data:` payload.
#[derive(Debug, Deserialize)]
pub struct StreamFrame {
    #[serde(default)]
    pub chunk: Option<String>,
}

/// Body returned alongside a non-2xx status.
#[derive(Debug, Deserialize)]
pub struct ServerErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}
