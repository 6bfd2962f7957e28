//! Forwarding chat requests to a backend and translating the answer.
//!
//! The streaming path yields one encoded NDJSON line per frame; the sink
//! (the HTTP body) applies backpressure by pulling, so a slow client slows
//! upstream consumption instead of buffering the response.

use crate::error::Result;
use crate::translate::ollama_types::{ChatFrame, ChatRequest, ToolCall};
use crate::translate::request::to_backend_request;
use crate::translate::streaming::FrameBuilder;
use crate::upstream::UpstreamClient;

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;
use tracing::{error, warn};

/// Stream of encoded NDJSON lines, ready to be written as a response body.
pub type FrameStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Forward a non-streaming chat request and translate the single response.
///
/// Tool calls, when present, become the tool-call terminal frame; a tool call
/// whose arguments fail to decode is dropped with a log line while the rest
/// are kept. Without (surviving) tool calls the response text becomes the
/// terminal frame's content.
pub async fn chat_non_streaming(chat: &ChatRequest, upstream: &UpstreamClient) -> Result<ChatFrame> {
    let backend_req = to_backend_request(chat);
    let response = upstream.chat_completion(&backend_req).await?;

    let mut frames = FrameBuilder::new(&chat.model);

    let Some(choice) = response.choices.first() else {
        return Ok(frames.end(""));
    };

    if let Some(ref tool_calls) = choice.message.tool_calls {
        for tool_call in tool_calls {
            let arguments = match serde_json::from_str(&tool_call.function.arguments) {
                Ok(args) => args,
                Err(e) => {
                    error!(
                        name = %tool_call.function.name,
                        error = %e,
                        "dropping tool call with undecodable arguments"
                    );
                    continue;
                }
            };
            frames.push_tool_call(ToolCall {
                name: tool_call.function.name.clone(),
                arguments,
            });
        }

        if frames.has_tool_calls() {
            return Ok(frames.call());
        }
    }

    Ok(frames.end(choice.message.content.as_deref().unwrap_or("")))
}

/// Forward a streaming chat request and return the downstream frame stream.
///
/// One frame per upstream delta, then exactly one terminal frame once the
/// upstream stream is exhausted or errors. Frame encoding failures are logged
/// and skipped rather than aborting a response already under way.
pub async fn chat_streaming(chat: &ChatRequest, upstream: &UpstreamClient) -> Result<FrameStream> {
    let backend_req = to_backend_request(chat);
    let mut chunks = upstream.chat_completion_stream(&backend_req).await?;

    let model = chat.model.clone();

    let frame_stream = async_stream::stream! {
        let mut frames = FrameBuilder::new(&model);

        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    let delta = chunk
                        .choices
                        .first()
                        .and_then(|c| c.delta.content.as_deref())
                        .unwrap_or("");

                    match encode_frame(&frames.next(delta)) {
                        Ok(line) => yield Ok(line),
                        Err(e) => warn!(error = %e, "failed to encode stream frame"),
                    }
                }
                Err(e) => {
                    // Frames already sent stand; close out below.
                    error!(error = %e, "backend stream error");
                    break;
                }
            }
        }

        match encode_frame(&frames.end("")) {
            Ok(line) => yield Ok(line),
            Err(e) => warn!(error = %e, "failed to encode terminal frame"),
        }
    };

    Ok(Box::pin(frame_stream))
}

fn encode_frame(frame: &ChatFrame) -> Result<Bytes> {
    let mut line = serde_json::to_vec(frame)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_is_one_line() {
        let mut frames = FrameBuilder::new("m");
        let line = encode_frame(&frames.next("hi")).unwrap();
        assert!(line.ends_with(b"\n"));
        // Exactly one newline, at the end.
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);

        let decoded: ChatFrame = serde_json::from_slice(&line).unwrap();
        assert_eq!(decoded.message.content, "hi");
    }
}
