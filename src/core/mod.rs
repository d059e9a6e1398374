//! Global timing shared by the simulation plugins.
pub mod plugin;

pub use plugin::CorePlugin;
