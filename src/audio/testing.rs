//! Scripted backend and handle used by the unit tests

use std::cell::Cell;
use std::rc::Rc;

use super::backend::{AudioBackend, CallStatus, ContextHandle, DeviceHandle, DeviceStatus};
use super::error::AudioError;
use super::handle::{PlaybackHandle, PlaybackState};

/// Step at which [`FakeBackend`] should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    /// The subsystem is missing
    Absent,
    /// Open returns no device
    Open,
    /// Open returns a device but reports an error status
    OpenStatus,
    /// Context creation returns nothing
    CreateContext,
    /// Making the context current reports an error
    MakeCurrent,
}

/// Backend that records every call and fails on request
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub fail_at: Option<FailAt>,
    pub log: Vec<&'static str>,
    pub open_devices: Vec<DeviceHandle>,
    pub current: Option<ContextHandle>,
    pub contexts_created: u32,
    pub contexts_destroyed: u32,
    pub devices_closed: u32,
    pub pending_device_error: DeviceStatus,
    pub pending_call_error: CallStatus,
    pub mixer_rate: Option<u32>,
    next_id: u32,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(step: FailAt) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl AudioBackend for FakeBackend {
    fn open_device(&mut self, _identifier: &str) -> Result<Option<DeviceHandle>, AudioError> {
        self.log.push("open");
        match self.fail_at {
            Some(FailAt::Absent) => Err(AudioError::BackendUnavailable(String::from("absent"))),
            Some(FailAt::Open) => {
                self.pending_device_error = DeviceStatus::InvalidDevice;
                Ok(None)
            }
            Some(FailAt::OpenStatus) => {
                self.pending_device_error = DeviceStatus::OutOfMemory;
                let device = DeviceHandle::from_raw(self.next_id());
                self.open_devices.extend(device);
                Ok(device)
            }
            _ => {
                let device = DeviceHandle::from_raw(self.next_id());
                self.open_devices.extend(device);
                Ok(device)
            }
        }
    }

    fn create_context(
        &mut self,
        _device: DeviceHandle,
        _attributes: &[i32],
    ) -> Option<ContextHandle> {
        self.log.push("create_context");
        if self.fail_at == Some(FailAt::CreateContext) {
            self.pending_device_error = DeviceStatus::InvalidValue;
            return None;
        }
        self.contexts_created += 1;
        ContextHandle::from_raw(self.next_id())
    }

    fn make_context_current(&mut self, context: Option<ContextHandle>) -> bool {
        if context.is_none() {
            self.log.push("clear_current");
            self.current = None;
            return true;
        }
        self.log.push("make_current");
        if self.fail_at == Some(FailAt::MakeCurrent) {
            self.pending_device_error = DeviceStatus::InvalidContext;
            return false;
        }
        self.current = context;
        true
    }

    fn destroy_context(&mut self, _context: ContextHandle) {
        self.log.push("destroy_context");
        self.contexts_destroyed += 1;
    }

    fn close_device(&mut self, device: DeviceHandle) -> bool {
        self.log.push("close");
        let before = self.open_devices.len();
        self.open_devices.retain(|&open| open != device);
        if self.open_devices.len() == before {
            return false;
        }
        self.devices_closed += 1;
        true
    }

    fn device_error(&mut self, _device: Option<DeviceHandle>) -> DeviceStatus {
        std::mem::take(&mut self.pending_device_error)
    }

    fn runtime_error(&mut self) -> CallStatus {
        std::mem::take(&mut self.pending_call_error)
    }

    fn set_mixer_output_rate(&mut self, rate: u32) {
        self.mixer_rate = Some(rate);
    }
}

/// Counters shared between a [`FakeHandle`] and the test that created it
#[derive(Debug, Clone, Default)]
pub struct HandleCounters {
    pub disposed: Rc<Cell<u32>>,
    pub loop_checks: Rc<Cell<u32>>,
    pub restarts: Rc<Cell<u32>>,
}

/// Playback handle with a directly settable state
#[derive(Debug)]
pub struct FakeHandle {
    pub state: PlaybackState,
    pub looping: bool,
    counters: HandleCounters,
}

impl FakeHandle {
    pub fn new(state: PlaybackState) -> Self {
        Self {
            state,
            looping: false,
            counters: HandleCounters::default(),
        }
    }

    pub fn looping(state: PlaybackState) -> Self {
        Self {
            looping: true,
            ..Self::new(state)
        }
    }

    pub fn counters(&self) -> HandleCounters {
        self.counters.clone()
    }
}

impl PlaybackHandle for FakeHandle {
    fn state(&self) -> PlaybackState {
        self.state
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    fn dispose(&mut self) {
        self.counters.disposed.set(self.counters.disposed.get() + 1);
        self.state = PlaybackState::Stopped;
    }

    fn check_loop(&mut self) {
        self.counters.loop_checks.set(self.counters.loop_checks.get() + 1);
        if self.looping && self.state == PlaybackState::Stopped {
            self.counters.restarts.set(self.counters.restarts.get() + 1);
            self.play();
        }
    }
}
