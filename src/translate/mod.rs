//! API translation between the Ollama and OpenAI chat formats.
//!
//! The core of the proxy: converts inbound requests into the backend's shape
//! and backend responses (streaming or not) into downstream frames. All
//! translation functions are pure (no I/O).

pub mod ollama_types;
pub mod openai_types;
pub mod request;
pub mod streaming;
