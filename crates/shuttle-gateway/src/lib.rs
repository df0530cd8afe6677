//! shuttle-gateway - HTTP front for the chat service
//!
//! Thin axum handlers over [`shuttle_core::ChatService`]: chat, health,
//! provider listing and runtime provider switching.

pub mod protocol;
pub mod server;

pub use server::{GatewayServer, GatewayState};
