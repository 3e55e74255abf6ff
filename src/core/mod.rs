//! Core engine module
//!
//! Contains the headless tick loop that drives the audio engine

mod engine;
mod time;

pub use engine::{App, Engine, EngineConfig, EngineContext};
pub use time::Time;
