//! Native audio subsystem boundary
//!
//! The engine talks to the output device only through [`AudioBackend`].
//! Every call is non-panicking: failures are reported as status codes that
//! the caller must query explicitly after each step.

use std::fmt;
use std::num::NonZeroU32;

use super::error::AudioError;

/// Opaque handle to an opened output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(NonZeroU32);

impl DeviceHandle {
    /// Wrap a raw backend id. Returns `None` for the null handle.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Get the raw backend id
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Opaque handle to a rendering context created on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(NonZeroU32);

impl ContextHandle {
    /// Wrap a raw backend id. Returns `None` for the null handle.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Get the raw backend id
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Device-layer status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceStatus {
    /// No error is pending
    #[default]
    NoError,
    /// The device handle is invalid or the device could not be opened
    InvalidDevice,
    /// The context handle is invalid
    InvalidContext,
    /// An unknown enum value was passed
    InvalidEnum,
    /// An invalid value was passed
    InvalidValue,
    /// The backend ran out of memory
    OutOfMemory,
}

impl DeviceStatus {
    /// Check whether this status is clear
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::NoError)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoError => "no error",
            Self::InvalidDevice => "invalid device",
            Self::InvalidContext => "invalid context",
            Self::InvalidEnum => "invalid enum",
            Self::InvalidValue => "invalid value",
            Self::OutOfMemory => "out of memory",
        };
        f.write_str(name)
    }
}

/// Status code for ordinary audio calls made while a context is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallStatus {
    /// No error is pending
    #[default]
    NoError,
    /// A bad object name was used
    InvalidName,
    /// An unknown enum value was passed
    InvalidEnum,
    /// An invalid value was passed
    InvalidValue,
    /// The call is not allowed in the current state
    InvalidOperation,
    /// The backend ran out of memory
    OutOfMemory,
}

impl CallStatus {
    /// Check whether this status is clear
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::NoError)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoError => "no error",
            Self::InvalidName => "invalid name",
            Self::InvalidEnum => "invalid enum",
            Self::InvalidValue => "invalid value",
            Self::InvalidOperation => "invalid operation",
            Self::OutOfMemory => "out of memory",
        };
        f.write_str(name)
    }
}

/// The native audio subsystem as seen by [`AudioDevice`](super::AudioDevice).
///
/// Querying [`device_error`](Self::device_error) or
/// [`runtime_error`](Self::runtime_error) returns the pending status and
/// clears it.
pub trait AudioBackend {
    /// Open an output device. An empty identifier selects the default device.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::BackendUnavailable`] if the subsystem itself is
    /// missing. An ordinary open failure returns `Ok(None)` and sets the
    /// device status.
    fn open_device(&mut self, identifier: &str) -> Result<Option<DeviceHandle>, AudioError>;

    /// Create a rendering context on an opened device.
    fn create_context(&mut self, device: DeviceHandle, attributes: &[i32])
    -> Option<ContextHandle>;

    /// Make a context current, or clear the current context with `None`.
    fn make_context_current(&mut self, context: Option<ContextHandle>) -> bool;

    /// Destroy a context
    fn destroy_context(&mut self, context: ContextHandle);

    /// Close a device
    fn close_device(&mut self, device: DeviceHandle) -> bool;

    /// Take the pending device-layer status
    fn device_error(&mut self, device: Option<DeviceHandle>) -> DeviceStatus;

    /// Take the pending status of ordinary audio calls
    fn runtime_error(&mut self) -> CallStatus {
        CallStatus::NoError
    }

    /// Override the mixer output rate before any device is opened.
    fn set_mixer_output_rate(&mut self, _rate: u32) {}
}

/// A backend for hosts without any audio subsystem.
///
/// Every device open fails, so an engine built on it always runs silent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn open_device(&mut self, _identifier: &str) -> Result<Option<DeviceHandle>, AudioError> {
        Err(AudioError::BackendUnavailable(String::from(
            "no audio subsystem compiled in",
        )))
    }

    fn create_context(
        &mut self,
        _device: DeviceHandle,
        _attributes: &[i32],
    ) -> Option<ContextHandle> {
        None
    }

    fn make_context_current(&mut self, context: Option<ContextHandle>) -> bool {
        context.is_none()
    }

    fn destroy_context(&mut self, _context: ContextHandle) {}

    fn close_device(&mut self, _device: DeviceHandle) -> bool {
        false
    }

    fn device_error(&mut self, _device: Option<DeviceHandle>) -> DeviceStatus {
        DeviceStatus::NoError
    }
}
