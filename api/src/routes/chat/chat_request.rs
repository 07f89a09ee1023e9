use serde::Deserialize;

/// Request payload for POST /api/chat.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's question. Checked by the handler so a missing field gets
    /// the same 400 shape as an empty one.
    #[serde(default)]
    pub query: Option<String>,
    /// Optional document to answer from; the default document is used when absent.
    #[serde(default)]
    pub knowledge_base_content: Option<String>,
}
