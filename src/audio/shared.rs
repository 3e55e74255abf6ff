//! Lazily created, once-only audio engine

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use super::backend::AudioBackend;
use super::config::AudioConfig;
use super::engine::AudioEngine;

/// Holder that creates its [`AudioEngine`] on first access.
///
/// The host keeps one of these for the lifetime of its audio subsystem.
/// First access acquires the device; racing first accesses from several
/// threads still construct exactly one engine.
#[derive(Debug)]
pub struct SharedAudioEngine<B: AudioBackend> {
    engine: OnceLock<Mutex<AudioEngine<B>>>,
    config: AudioConfig,
    factory: fn() -> B,
}

impl<B: AudioBackend> SharedAudioEngine<B> {
    /// Create an empty holder. Nothing is acquired until first access.
    #[must_use]
    pub const fn new(config: AudioConfig, factory: fn() -> B) -> Self {
        Self {
            engine: OnceLock::new(),
            config,
            factory,
        }
    }

    /// Get the engine, creating it on first call
    pub fn lock(&self) -> MutexGuard<'_, AudioEngine<B>> {
        self.engine
            .get_or_init(|| {
                log::debug!("Creating audio engine");
                Mutex::new(AudioEngine::new((self.factory)(), self.config.clone()))
            })
            .lock()
            // A panic mid-update leaves the collections consistent
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the engine without locking, creating it on first call
    pub fn get_mut(&mut self) -> &mut AudioEngine<B> {
        drop(self.lock());
        self.engine
            .get_mut()
            .expect("engine was initialized by lock")
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the engine has been created
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Dispose and drop the engine, if it was created.
    ///
    /// The next access creates a fresh engine.
    pub fn shutdown(&mut self) {
        if let Some(engine) = self.engine.take() {
            let mut engine = engine.into_inner().unwrap_or_else(PoisonError::into_inner);
            engine.dispose(true);
        }
    }
}
