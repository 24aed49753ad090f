//! WebSocket transport: wire types, trigger routing and the socket handler

pub mod dispatch;
pub mod handler;
pub mod protocol;
