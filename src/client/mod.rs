//! Client side of the protocol: the world mirror and the headless client loop

pub mod connection;
pub mod frame_clock;
pub mod input;
pub mod mirror;
pub mod reconcile;

pub use connection::{run, ClientError, ClientOptions, InputPlan};
pub use frame_clock::FrameClock;
pub use mirror::ClientMirror;
pub use reconcile::{calculate_correction, Reconciler};
