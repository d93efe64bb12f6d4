use serde::Deserialize;

const MAX_SAFE_MESSAGE_CHARS: usize = 100;
const UNKNOWN_ERROR: &str = "Unknown error";

/// Error body sent by the registry on failed calls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Parse a response body, `None` when it is not an error document.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// Short summary fit for logs: `message`, else `error`, truncated.
    pub fn safe_message(&self) -> String {
        [self.message.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
            .map(truncate)
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
    }

    /// Summary of an arbitrary body; non-JSON bodies are not echoed.
    pub fn summarize(body: &str) -> String {
        Self::parse(body)
            .map(|response| response.safe_message())
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_SAFE_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
