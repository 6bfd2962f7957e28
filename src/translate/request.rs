//! Translate inbound Ollama chat requests into OpenAI Chat Completions requests.
//!
//! Pure functions, no I/O. Role names map one-for-one where both protocols
//! agree; anything unrecognized becomes a `user` message.

use serde_json::value::RawValue;

use super::ollama_types::ChatRequest;
use super::openai_types::{
    ChatCompletionRequest, ChatFunction, ChatMessage, ChatTool, FunctionParameters, ResponseFormat,
};

/// Build the backend request for an inbound chat request.
///
/// Tool definitions are only forwarded on non-streaming requests: the backend
/// protocol delivers tool calls as a complete message, which cannot be
/// reconciled with the incremental frame stream, so streaming requests go out
/// without them.
pub fn to_backend_request(chat: &ChatRequest) -> ChatCompletionRequest {
    let messages = chat
        .messages
        .iter()
        .map(|m| ChatMessage {
            role: map_role(&m.role).to_string(),
            content: m.content.clone(),
        })
        .collect();

    let tools = match (&chat.tools, chat.stream) {
        (Some(tools), false) => Some(
            tools
                .iter()
                .map(|t| ChatTool {
                    tool_type: "function".to_string(),
                    function: ChatFunction {
                        name: t.function.name.clone(),
                        description: t.function.description.clone(),
                        parameters: FunctionParameters {
                            schema_type: t.function.parameters.schema_type.clone(),
                            properties: t.function.parameters.properties.clone(),
                            required: t.function.parameters.required.clone(),
                        },
                    },
                })
                .collect(),
        ),
        _ => None,
    };

    ChatCompletionRequest {
        model: chat.model.clone(),
        messages,
        stream: chat.stream.then_some(true),
        tools,
        response_format: chat.format.as_deref().and_then(map_format),
    }
}

fn map_role(role: &str) -> &'static str {
    match role {
        "system" => "system",
        "assistant" => "assistant",
        _ => "user",
    }
}

/// The exact byte sequence `json` (not the JSON string `"json"`) selects
/// unstructured JSON-object mode; any other non-empty value is forwarded as a
/// schema document for structured output.
fn map_format(raw: &RawValue) -> Option<ResponseFormat> {
    let bytes = raw.get().as_bytes();
    if bytes.is_empty() {
        return None;
    }
    if bytes == b"json" {
        Some(ResponseFormat::json_object())
    } else {
        Some(ResponseFormat::json_schema(raw.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::openai_types::STRUCTURED_OUTPUT_NAME;

    fn request_from_json(body: &str) -> ChatRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_role_mapping() {
        let chat = request_from_json(
            r#"{
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "assistant", "content": "ok"},
                    {"role": "user", "content": "hi"},
                    {"role": "tool", "content": "weird"}
                ]
            }"#,
        );

        let backend = to_backend_request(&chat);
        let roles: Vec<&str> = backend.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "assistant", "user", "user"]);
    }

    #[test]
    fn test_tools_attached_when_not_streaming() {
        let chat = request_from_json(
            r#"{
                "model": "gpt-4o",
                "messages": [],
                "stream": false,
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "lookup",
                        "description": "Look something up",
                        "parameters": {
                            "type": "object",
                            "properties": {"q": {"type": "string"}},
                            "required": ["q"]
                        }
                    }
                }]
            }"#,
        );

        let backend = to_backend_request(&chat);
        let tools = backend.tools.expect("tools should be forwarded");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "lookup");
        assert_eq!(tools[0].function.parameters.required, vec!["q"]);
    }

    #[test]
    fn test_tools_dropped_when_streaming() {
        let chat = request_from_json(
            r#"{
                "model": "gpt-4o",
                "messages": [],
                "stream": true,
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "lookup",
                        "description": "",
                        "parameters": {"type": "object", "properties": {}, "required": []}
                    }
                }]
            }"#,
        );

        let backend = to_backend_request(&chat);
        assert!(backend.tools.is_none());
        assert_eq!(backend.stream, Some(true));
    }

    #[test]
    fn test_absent_format_leaves_response_format_unset() {
        let chat = request_from_json(r#"{"model": "gpt-4o", "messages": []}"#);
        let backend = to_backend_request(&chat);
        assert!(backend.response_format.is_none());
    }

    #[test]
    fn test_schema_format_becomes_structured_output() {
        let chat = request_from_json(
            r#"{
                "model": "gpt-4o",
                "messages": [],
                "format": {"type": "object", "properties": {"answer": {"type": "string"}}}
            }"#,
        );

        let backend = to_backend_request(&chat);
        match backend.response_format {
            Some(ResponseFormat::JsonSchema { ref json_schema }) => {
                assert_eq!(json_schema.name, STRUCTURED_OUTPUT_NAME);
                assert!(json_schema.schema.get().contains("answer"));
            }
            ref other => panic!("expected json_schema format, got {other:?}"),
        }
    }

    #[test]
    fn test_json_string_format_is_a_schema_document() {
        // The unstructured-JSON marker is the bare byte sequence `json`; the
        // JSON string "json" carries its quotes and goes down the schema path.
        let chat = request_from_json(r#"{"model": "gpt-4o", "messages": [], "format": "json"}"#);
        let backend = to_backend_request(&chat);
        assert!(matches!(
            backend.response_format,
            Some(ResponseFormat::JsonSchema { .. })
        ));
    }

    #[test]
    fn test_response_format_wire_shapes() {
        let json = serde_json::to_value(ResponseFormat::json_object()).unwrap();
        assert_eq!(json["type"], "json_object");

        let schema = serde_json::value::RawValue::from_string("{}".to_string()).unwrap();
        let json = serde_json::to_value(ResponseFormat::json_schema(schema)).unwrap();
        assert_eq!(json["type"], "json_schema");
        assert_eq!(json["json_schema"]["name"], STRUCTURED_OUTPUT_NAME);
    }
}
