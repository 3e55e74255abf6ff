//! Audio output engine for games built in Rust
//!
//! This crate provides:
//! - Output device acquisition with rollback and a silent fallback
//! - Per-tick release of finished fire-and-forget sounds
//! - Looping emulation for playbacks without native looping
//! - A headless tick loop that drives the above

pub mod audio;
pub mod core;

// Re-exports for convenience
pub use rodio;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::audio::{
        AudioBackend, AudioConfig, AudioEngine, InstanceKey, InstanceTable, NullBackend,
        PlaybackHandle, PlaybackState, RodioBackend, SharedAudioEngine, SoundEffect,
        SoundInstance,
    };
    pub use crate::core::{App, Engine, EngineConfig, EngineContext, Time};
}
