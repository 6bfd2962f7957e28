//! Per-request frame accumulator driving the downstream response sequence.
//!
//! A [`FrameBuilder`] is created for each chat request and produces the frames
//! written back to the client: zero or more non-terminal frames (one per
//! upstream delta) followed by exactly one terminal frame. The terminal flag
//! latches; once a terminal frame has been produced the builder never goes
//! back to non-terminal output.

use chrono::Utc;

use super::ollama_types::{ChatFrame, DoneReason, FrameMessage, ToolCall, ToolCallEntry};

#[derive(Debug)]
pub struct FrameBuilder {
    model: String,
    tool_calls: Vec<ToolCallEntry>,
    done: bool,
    done_reason: Option<DoneReason>,
}

impl FrameBuilder {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            tool_calls: Vec::new(),
            done: false,
            done_reason: None,
        }
    }

    /// Accumulate a decoded tool call for the tool-call terminal frame.
    pub fn push_tool_call(&mut self, call: ToolCall) {
        self.tool_calls.push(ToolCallEntry { function: call });
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Produce one frame carrying this delta. Content is the increment alone,
    /// never the accumulated text. Accumulated tool calls ride along only on
    /// the tool-call terminal frame; every other frame leaves them off.
    pub fn next(&mut self, content: &str) -> ChatFrame {
        let tool_calls = match self.done_reason {
            Some(DoneReason::ToolCall) if !self.tool_calls.is_empty() => {
                Some(self.tool_calls.clone())
            }
            _ => None,
        };

        ChatFrame {
            model: self.model.clone(),
            created_at: Utc::now(),
            message: FrameMessage {
                role: "assistant".to_string(),
                content: content.to_string(),
                tool_calls,
            },
            done_reason: self.done_reason,
            done: self.done,
        }
    }

    /// Produce the terminal frame. Latches `done`; callers emit nothing after.
    pub fn end(&mut self, content: &str) -> ChatFrame {
        self.done = true;
        self.next(content)
    }

    /// Produce the tool-call terminal frame: empty content, accumulated calls.
    pub fn call(&mut self) -> ChatFrame {
        self.done_reason = Some(DoneReason::ToolCall);
        self.end("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_call() -> ToolCall {
        let arguments: HashMap<_, _> =
            serde_json::from_str(r#"{"q": "x"}"#).unwrap();
        ToolCall {
            name: "lookup".to_string(),
            arguments,
        }
    }

    #[test]
    fn test_delta_frames_are_not_terminal() {
        let mut frames = FrameBuilder::new("test-model");

        let first = frames.next("He");
        assert_eq!(first.message.content, "He");
        assert_eq!(first.message.role, "assistant");
        assert!(!first.done);
        assert!(first.done_reason.is_none());

        let second = frames.next("llo");
        assert_eq!(second.message.content, "llo");
        assert!(!second.done);
    }

    #[test]
    fn test_end_latches_terminal() {
        let mut frames = FrameBuilder::new("test-model");
        let _ = frames.next("hi");

        let last = frames.end("");
        assert!(last.done);
        assert!(last.done_reason.is_none());
        assert_eq!(last.message.content, "");
    }

    #[test]
    fn test_tool_call_terminal_frame() {
        let mut frames = FrameBuilder::new("test-model");
        frames.push_tool_call(lookup_call());
        assert!(frames.has_tool_calls());

        let last = frames.call();
        assert!(last.done);
        assert_eq!(last.done_reason, Some(DoneReason::ToolCall));
        assert_eq!(last.message.content, "");

        let calls = last.message.tool_calls.expect("tool calls attached");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "lookup");
        assert_eq!(calls[0].function.arguments["q"].get(), "\"x\"");
    }

    #[test]
    fn test_non_tool_frames_never_carry_tool_calls() {
        let mut frames = FrameBuilder::new("test-model");
        frames.push_tool_call(lookup_call());

        // Neither a delta frame nor a plain terminal frame exposes the
        // accumulated calls; only the tool-call terminal reason does.
        assert!(frames.next("text").message.tool_calls.is_none());
        assert!(frames.end("").message.tool_calls.is_none());
    }

    #[test]
    fn test_done_reason_serialization() {
        let mut frames = FrameBuilder::new("m");
        frames.push_tool_call(lookup_call());
        let json = serde_json::to_value(frames.call()).unwrap();
        assert_eq!(json["done_reason"], "toolCall");
        assert_eq!(json["done"], true);

        let mut frames = FrameBuilder::new("m");
        let json = serde_json::to_value(frames.end("bye")).unwrap();
        assert!(json.get("done_reason").is_none());
        assert_eq!(json["message"]["content"], "bye");
    }
}
