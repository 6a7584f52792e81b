//! cascade-gateway — HTTP front door for the fallback router
//!
//! Exposes `POST /api/chat` for prompts and `GET /api/health` for a view of
//! the configured chain. Prompt validation happens here, before the router
//! is involved, and provider diagnostics never leave the server.

pub mod protocol;
pub mod server;

pub use protocol::{ChatReply, HealthReport, ProviderStatus};
pub use server::{AppState, GatewayServer, create_router};
