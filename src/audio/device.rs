//! Output device and context lifecycle

use super::backend::{AudioBackend, ContextHandle, DeviceHandle, DeviceStatus};
use super::error::AudioError;

/// Owns the native device and context handles acquired from a backend.
///
/// `available` is only ever true while both handles are held and the
/// context is current.
#[derive(Debug)]
pub struct AudioDevice<B: AudioBackend> {
    backend: B,
    device: Option<DeviceHandle>,
    context: Option<ContextHandle>,
    available: bool,
}

impl<B: AudioBackend> AudioDevice<B> {
    /// Wrap a backend without acquiring anything yet
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            device: None,
            context: None,
            available: false,
        }
    }

    /// Acquire the device and make a fresh context current.
    ///
    /// Returns `false` on any failure. A failure after the device was opened
    /// rolls back everything acquired so far.
    pub fn initialize(&mut self, identifier: &str) -> bool {
        match self.try_initialize(identifier) {
            Ok(()) => {
                log::info!("Audio device opened");
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    fn try_initialize(&mut self, identifier: &str) -> Result<(), AudioError> {
        self.device = self.backend.open_device(identifier)?;

        let status = self.backend.device_error(self.device);
        let Some(device) = self.device.filter(|_| status.is_ok()) else {
            return Err(AudioError::DeviceOpenFailure(Self::or_invalid(
                status,
                DeviceStatus::InvalidDevice,
            )));
        };

        self.context = self.backend.create_context(device, &[]);
        let status = self.backend.device_error(self.device);
        if !status.is_ok() || self.context.is_none() {
            self.teardown();
            return Err(AudioError::ContextCreateFailure(Self::or_invalid(
                status,
                DeviceStatus::InvalidContext,
            )));
        }

        let made_current = self.backend.make_context_current(self.context);
        let status = self.backend.device_error(self.device);
        if !status.is_ok() || !made_current {
            self.teardown();
            return Err(AudioError::ContextActivateFailure(Self::or_invalid(
                status,
                DeviceStatus::InvalidContext,
            )));
        }

        self.available = true;
        Ok(())
    }

    // A missing handle with a clear status still has to report something.
    fn or_invalid(status: DeviceStatus, fallback: DeviceStatus) -> DeviceStatus {
        if status.is_ok() { fallback } else { status }
    }

    /// Release the context and device, whichever are held.
    ///
    /// Safe to call any number of times.
    pub fn teardown(&mut self) {
        self.backend.make_context_current(None);
        if let Some(context) = self.context.take() {
            self.backend.destroy_context(context);
        }
        if let Some(device) = self.device.take() {
            if !self.backend.close_device(device) {
                log::warn!("Audio device {} did not close cleanly", device.raw());
            }
        }
        self.available = false;
    }

    /// Take the pending runtime call status as an error, if any
    pub fn check_runtime_error(&mut self) -> Option<AudioError> {
        let status = self.backend.runtime_error();
        (!status.is_ok()).then_some(AudioError::RuntimeCallError(status))
    }

    /// Check if the device and context are usable
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Get the device handle, if held
    #[must_use]
    pub const fn device(&self) -> Option<DeviceHandle> {
        self.device
    }

    /// Get the context handle, if held
    #[must_use]
    pub const fn context(&self) -> Option<ContextHandle> {
        self.context
    }

    /// Get the backend
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the backend mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: AudioBackend> Drop for AudioDevice<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
