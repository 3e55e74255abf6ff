//! Audio output engine
//!
//! Acquires the output device, keeps track of in-flight sound instances and
//! performs the per-tick bookkeeping that releases finished fire-and-forget
//! sounds and restarts looping ones. If the device cannot be acquired the
//! engine falls back to silent mode instead of failing.
//!
//! Built on top of the rodio audio library.

mod backend;
mod config;
mod device;
mod engine;
mod error;
mod handle;
mod output;
mod shared;
mod source;
mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    AudioBackend, CallStatus, ContextHandle, DeviceHandle, DeviceStatus, NullBackend,
};
pub use config::{APPLE_MIXER_OUTPUT_RATE, AudioConfig, ConfigError};
pub use device::AudioDevice;
pub use engine::{AudioEngine, AudioStats};
pub use error::AudioError;
pub use handle::{PlaybackHandle, PlaybackState};
pub use output::RodioBackend;
pub use shared::SharedAudioEngine;
pub use source::{SoundEffect, SoundInstance};
pub use table::{InstanceKey, InstanceTable};
