//! # Rollcall Gateway
//! HTTP surface: health checks for the hosting platform and the Telegram webhook.

pub mod server;

pub use server::{GatewayState, build_router, start};
