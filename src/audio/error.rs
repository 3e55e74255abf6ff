//! Audio error types

use super::backend::{CallStatus, DeviceStatus};

/// Errors that can occur while acquiring or driving the audio output.
///
/// None of these reach callers of [`AudioEngine::update`](super::AudioEngine::update);
/// acquisition failures end up as silent mode plus a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The audio subsystem is missing entirely
    BackendUnavailable(String),
    /// The output device could not be opened
    DeviceOpenFailure(DeviceStatus),
    /// A context could not be created on the opened device
    ContextCreateFailure(DeviceStatus),
    /// The created context could not be made current
    ContextActivateFailure(DeviceStatus),
    /// An ordinary audio call reported an error
    RuntimeCallError(CallStatus),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackendUnavailable(e) => write!(f, "Audio backend unavailable: {e}"),
            Self::DeviceOpenFailure(s) => write!(f, "Could not open audio device: {s}"),
            Self::ContextCreateFailure(s) => write!(f, "Could not create audio context: {s}"),
            Self::ContextActivateFailure(s) => {
                write!(f, "Could not make audio context current: {s}")
            }
            Self::RuntimeCallError(s) => write!(f, "Audio call error: {s}"),
        }
    }
}

impl std::error::Error for AudioError {}
