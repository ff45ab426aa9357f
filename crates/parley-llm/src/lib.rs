//! Model gateway and response handling for Parley
//!
//! This crate talks to the language-model backend, splits replies into
//! thinking and answer, reports calls to an optional observer, and keeps
//! per-session conversation state.

pub mod gateway;
pub mod observer;
pub mod segmenter;
pub mod session;

// Re-export key types for convenience
pub use gateway::{GatewayRequest, ModelGateway, OllamaGateway, outbound_messages};
pub use observer::{ChatObserver, ChatSpan, InvocationParams, SpanStatus, TracingObserver};
pub use segmenter::{Delimiter, SegmentedResponse, THINKING_DELIMITERS, segment};
pub use session::{ChatSession, ChatTurn, resolve_model};
