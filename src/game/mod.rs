//! Game simulation modules

pub mod combat;
pub mod entity;
pub mod geometry;
pub mod input;
pub mod outbox;
pub mod physics;
pub mod session;
pub mod world;

pub use geometry::Vec2;
pub use outbox::Outbox;
pub use world::{World, WorldCommand, WorldHandle, WorldRunner, WorldStats};
