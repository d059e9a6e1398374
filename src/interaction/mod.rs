//! Multi-channel interaction session: channels, exclusivity rules, arousal and the coordinator.
pub mod action;
pub mod arousal;
pub mod channel;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod plugin;
pub mod rules;
pub mod stats;
pub mod systems;
pub mod telemetry;

pub use plugin::InteractionPlugin;
