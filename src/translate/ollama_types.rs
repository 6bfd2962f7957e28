//! Type definitions for the Ollama-compatible surface this proxy exposes.
//!
//! Covers the inbound `/api/chat` request, the `/api/tags` listing, and the
//! response frames written back to the client — one JSON object per line when
//! streaming, a single object otherwise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Inbound request
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    #[serde(default)]
    pub stream: bool,
    /// Accepted for schema compatibility; this proxy keeps nothing loaded.
    #[serde(default)]
    pub keep_alive: Option<String>,
    /// Raw bytes of the `format` field: either the unstructured-JSON marker
    /// or a JSON Schema document, passed through untouched.
    #[serde(default)]
    pub format: Option<Box<RawValue>>,
    #[serde(default)]
    pub tools: Option<Vec<ToolDef>>,
    #[serde(default)]
    pub options: ChatOptions,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ToolDef {
    #[serde(rename = "type", default)]
    pub tool_type: String,
    pub function: ToolFunctionDef,
}

#[derive(Debug, Deserialize)]
pub struct ToolFunctionDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: ToolParameters,
}

#[derive(Debug, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type", default)]
    pub schema_type: String,
    #[serde(default)]
    pub properties: HashMap<String, Box<RawValue>>,
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatOptions {
    /// Decoded but not forwarded; the backend protocol has no equivalent knob.
    #[serde(default)]
    pub num_ctx: i64,
}

// ---------------------------------------------------------------------------
// Response frames
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFrame {
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub message: FrameMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<DoneReason>,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoneReason {
    #[serde(rename = "toolCall")]
    ToolCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallEntry {
    pub function: ToolCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: HashMap<String, Box<RawValue>>,
}

// ---------------------------------------------------------------------------
// Model listing
// ---------------------------------------------------------------------------

/// One exposed model. `name` and `model` always carry the same value; Ollama
/// clients read both fields, so both are kept on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    pub models: Vec<ModelEntry>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
