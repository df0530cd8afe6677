//! shuttle-core - Provider-agnostic chat plumbing
//!
//! This crate provides:
//! - Registry of chat providers keyed by identifier, open for extension
//! - Single-model and multi-model providers over a narrow vendor transport
//! - Ordered model fallback with per-attempt timeouts
//! - Recovery of JSON payloads from fenced or prose-wrapped replies
//! - Process-wide provider selection with per-request override

pub mod config;
pub mod error;
pub mod extract;
pub mod providers;
pub mod registry;
pub mod service;

// Re-export main types for convenience
pub use config::{ConfigResolver, ProviderEnv, mask_secret};
pub use error::ProviderError;
pub use extract::{Extraction, ExtractionErrorKind, extract, strip_fences};
pub use providers::{
    Attempt, ChatMessage, ChatRole, ChatTransport, EchoProvider, FallbackExecutor, LlmProvider,
    MultiModelProvider, SingleModelProvider,
};
pub use registry::{ProviderRegistry, ProviderStatus};
pub use service::{ChatReply, ChatRequest, ChatService, DEFAULT_SYSTEM_PROMPT, Status};
