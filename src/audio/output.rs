//! Rodio-backed output device
//!
//! Maps the device/context model onto rodio: opening a device selects a
//! cpal output device, creating a context opens an output stream on it,
//! and the current context is the one whose mixer new sinks connect to.
//! Errors the stream reports from its own thread are held until the next
//! runtime error query.

use std::sync::{Arc, Mutex, PoisonError};

use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::cpal::{self, StreamError};
use rodio::mixer::Mixer;
use rodio::{OutputStream, OutputStreamBuilder};

use super::backend::{AudioBackend, CallStatus, ContextHandle, DeviceHandle, DeviceStatus};
use super::error::AudioError;

/// Status shared with the stream's error callback
#[derive(Debug, Clone, Default)]
struct StreamErrors(Arc<Mutex<CallStatus>>);

impl StreamErrors {
    /// Record an error unless an earlier one is still pending
    fn record(&self, error: &StreamError) {
        log::debug!("Output stream error: {error}");
        let mut status = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if status.is_ok() {
            *status = CallStatus::InvalidOperation;
        }
    }

    fn take(&self) -> CallStatus {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Audio backend driving the system output through rodio.
///
/// Holds at most one device and one context at a time.
pub struct RodioBackend {
    device: Option<(DeviceHandle, cpal::Device)>,
    stream: Option<(ContextHandle, OutputStream)>,
    current: Option<ContextHandle>,
    mixer_rate: Option<u32>,
    status: DeviceStatus,
    errors: StreamErrors,
    next_id: u32,
}

impl RodioBackend {
    /// Create a backend with nothing opened
    #[must_use]
    pub fn new() -> Self {
        Self {
            device: None,
            stream: None,
            current: None,
            mixer_rate: None,
            status: DeviceStatus::NoError,
            errors: StreamErrors::default(),
            next_id: 0,
        }
    }

    /// Get the mixer of the current context.
    ///
    /// Sinks for new sound instances connect here.
    #[must_use]
    pub fn mixer(&self) -> Option<&Mixer> {
        match (&self.stream, self.current) {
            (Some((context, stream)), Some(current)) if *context == current => {
                Some(stream.mixer())
            }
            _ => None,
        }
    }

    fn next_id(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_id
    }

    fn find_device(identifier: &str) -> Result<cpal::Device, String> {
        let host = cpal::default_host();
        if identifier.is_empty() {
            return host
                .default_output_device()
                .ok_or_else(|| String::from("no default output device"));
        }

        host.output_devices()
            .map_err(|e| e.to_string())?
            .find(|device| device.name().is_ok_and(|name| name == identifier))
            .ok_or_else(|| format!("no output device named '{identifier}'"))
    }

    fn open_stream(&self, device: &cpal::Device) -> Result<OutputStream, String> {
        let builder =
            OutputStreamBuilder::from_device(device.clone()).map_err(|e| e.to_string())?;
        let builder = match self.mixer_rate {
            Some(rate) => builder.with_sample_rate(rate),
            None => builder,
        };

        let errors = self.errors.clone();
        builder
            .with_error_callback(move |e| errors.record(&e))
            .open_stream()
            .map_err(|e| e.to_string())
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for RodioBackend {
    fn open_device(&mut self, identifier: &str) -> Result<Option<DeviceHandle>, AudioError> {
        if self.device.is_some() {
            self.status = DeviceStatus::InvalidValue;
            return Ok(None);
        }

        let device = match Self::find_device(identifier) {
            Ok(device) => device,
            Err(e) => {
                log::debug!("Could not open output device: {e}");
                self.status = DeviceStatus::InvalidDevice;
                return Ok(None);
            }
        };

        let handle = DeviceHandle::from_raw(self.next_id());
        if let Some(handle) = handle {
            self.device = Some((handle, device));
        }
        Ok(handle)
    }

    fn create_context(
        &mut self,
        device: DeviceHandle,
        attributes: &[i32],
    ) -> Option<ContextHandle> {
        if !attributes.is_empty() {
            log::debug!("Ignoring {} context attributes", attributes.len());
        }

        let stream = match &self.device {
            Some((handle, output)) if *handle == device => self.open_stream(output),
            _ => {
                self.status = DeviceStatus::InvalidDevice;
                return None;
            }
        };

        match stream {
            Ok(stream) if self.stream.is_none() => {
                let context = ContextHandle::from_raw(self.next_id())?;
                self.stream = Some((context, stream));
                Some(context)
            }
            Ok(_) => {
                self.status = DeviceStatus::InvalidValue;
                None
            }
            Err(e) => {
                log::debug!("Could not open output stream: {e}");
                self.status = DeviceStatus::InvalidValue;
                None
            }
        }
    }

    fn make_context_current(&mut self, context: Option<ContextHandle>) -> bool {
        match context {
            None => {
                self.current = None;
                true
            }
            Some(context) if self.stream.as_ref().is_some_and(|(c, _)| *c == context) => {
                self.current = Some(context);
                true
            }
            Some(_) => {
                self.status = DeviceStatus::InvalidContext;
                false
            }
        }
    }

    fn destroy_context(&mut self, context: ContextHandle) {
        if !self.stream.as_ref().is_some_and(|(c, _)| *c == context) {
            self.status = DeviceStatus::InvalidContext;
            return;
        }
        if self.current == Some(context) {
            self.current = None;
        }
        self.stream = None;
    }

    fn close_device(&mut self, device: DeviceHandle) -> bool {
        let open = self.device.as_ref().is_some_and(|(d, _)| *d == device);
        // A device with a live context stays open
        if !open || self.stream.is_some() {
            self.status = DeviceStatus::InvalidDevice;
            return false;
        }
        self.device = None;
        true
    }

    fn device_error(&mut self, _device: Option<DeviceHandle>) -> DeviceStatus {
        std::mem::take(&mut self.status)
    }

    fn runtime_error(&mut self) -> CallStatus {
        self.errors.take()
    }

    fn set_mixer_output_rate(&mut self, rate: u32) {
        self.mixer_rate = Some(rate);
    }
}

impl std::fmt::Debug for RodioBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioBackend")
            .field("device", &self.device.as_ref().map(|(handle, _)| handle))
            .field("context", &self.stream.as_ref().map(|(handle, _)| handle))
            .field("current", &self.current)
            .field("mixer_rate", &self.mixer_rate)
            .field("errors", &self.errors)
            .finish()
    }
}
