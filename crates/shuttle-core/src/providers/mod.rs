//! Multi-provider chat abstraction layer
//!
//! Vendors implement [`ChatTransport`] (one call: model + messages in, text
//! out). Providers implement [`LlmProvider`] on top of a transport, either
//! pinned to one model ([`SingleModelProvider`]) or degrading across an
//! ordered candidate list ([`MultiModelProvider`] via [`FallbackExecutor`]).

pub mod anthropic;
pub mod descriptor;
pub mod echo;
pub mod fallback;
pub mod multi;
pub mod openai;
pub mod single;
pub mod types;

pub use descriptor::{ProviderDescriptor, WireFormat};
pub use echo::EchoProvider;
pub use fallback::{Attempt, FallbackExecutor};
pub use multi::MultiModelProvider;
pub use single::SingleModelProvider;
pub use types::{ChatMessage, ChatRole, ChatTransport, LlmProvider};
