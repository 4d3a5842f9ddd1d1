pub mod bezier;
pub mod block;
pub mod components;
pub mod config;
pub mod constants;
pub mod error;
pub mod gpu;
pub mod grounding;
pub mod heightfield;
pub mod import;
pub mod resources;
pub mod spawning;
pub mod systems;
pub mod terrain;
