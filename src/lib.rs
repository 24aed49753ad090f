//! Arena Server - authoritative multiplayer arena shooter
//!
//! The server advances a shared simulation at a fixed rate and streams
//! state to every connected client over WebSocket. The `client` module holds
//! the client-side mirror that extrapolates and reconciles that state.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
