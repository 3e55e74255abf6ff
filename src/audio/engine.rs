//! Audio engine: device ownership and per-tick instance bookkeeping

use rustc_hash::FxHashSet;

use super::backend::AudioBackend;
use super::config::AudioConfig;
use super::device::AudioDevice;
use super::handle::{PlaybackHandle, PlaybackState};
use super::table::{InstanceKey, InstanceTable};

/// Snapshot of the engine's bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioStats {
    /// Whether the output device is usable
    pub available: bool,
    /// Keys in the transient pool
    pub transient: usize,
    /// Keys in the loop-set
    pub looping: usize,
    /// Updates that did work since construction
    pub ticks: u64,
    /// Transient instances disposed since construction
    pub disposed: u64,
}

/// Owns the audio device and tracks in-flight playbacks.
///
/// Instances live in an [`InstanceTable`] owned by the host. The engine
/// holds two key collections into it:
/// - the transient pool: fire-and-forget instances the engine disposes
///   once they stop
/// - the loop-set: instances whose looping is emulated by restarting them
///   after they reach their end
///
/// When the device could not be acquired the engine runs silent: updates
/// and collection mutations do nothing.
#[derive(Debug)]
pub struct AudioEngine<B: AudioBackend> {
    device: AudioDevice<B>,
    config: AudioConfig,
    transient_pool: Vec<InstanceKey>,
    looping_set: FxHashSet<InstanceKey>,
    ticks: u64,
    disposed: u64,
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Create an engine and try to acquire the output device.
    ///
    /// Never fails: if acquisition fails the engine is returned silent.
    pub fn new(backend: B, config: AudioConfig) -> Self {
        let mut device = AudioDevice::new(backend);

        if let Some(rate) = config.mixer_output_rate {
            device.backend_mut().set_mixer_output_rate(rate);
        }

        if !device.initialize(&config.device_name) {
            log::warn!("No usable audio output, sound is disabled");
        }

        Self {
            device,
            transient_pool: Vec::with_capacity(config.pool_capacity),
            looping_set: FxHashSet::default(),
            config,
            ticks: 0,
            disposed: 0,
        }
    }

    /// Run one tick of maintenance.
    ///
    /// Disposes and forgets stopped transient instances, then lets every
    /// looping instance restart itself if it reached its end. The pool sweep
    /// always runs first, so a stopped transient instance is gone before the
    /// loop pass can restart it. Live looping instances keep their
    /// membership; only instances that no longer exist leave the loop-set.
    pub fn update<H: PlaybackHandle>(&mut self, instances: &mut InstanceTable<H>) {
        if !self.device.is_available() {
            return;
        }
        self.ticks += 1;

        if self.config.diagnostics
            && let Some(e) = self.device.check_runtime_error()
        {
            log::error!("{e}");
        }

        self.sweep_transient(instances);

        // Keys whose instance is gone lose their membership
        self.looping_set.retain(|&key| match instances.get_mut(key) {
            Some(handle) => {
                handle.check_loop();
                true
            }
            None => false,
        });
    }

    /// Compact the transient pool in place, keeping only live non-stopped
    /// instances. Order of the survivors is preserved.
    fn sweep_transient<H: PlaybackHandle>(&mut self, instances: &mut InstanceTable<H>) {
        let mut write = 0;

        for read in 0..self.transient_pool.len() {
            let key = self.transient_pool[read];

            let keep = match instances.get_mut(key) {
                Some(handle) if handle.state() == PlaybackState::Stopped => {
                    handle.dispose();
                    instances.remove(key);
                    self.looping_set.remove(&key);
                    self.disposed += 1;
                    false
                }
                Some(_) => true,
                // Removed by its owner
                None => false,
            };

            if keep {
                self.transient_pool[write] = key;
                write += 1;
            }
        }

        if write < self.transient_pool.len() {
            log::trace!(
                "Released {} finished sound instances",
                self.transient_pool.len() - write
            );
        }
        self.transient_pool.truncate(write);
    }

    /// Start a fire-and-forget instance the engine disposes once it stops.
    ///
    /// Looping instances are also added to the loop-set. Returns `None`
    /// in silent mode, after disposing the handle.
    pub fn play_transient<H: PlaybackHandle>(
        &mut self,
        instances: &mut InstanceTable<H>,
        mut handle: H,
    ) -> Option<InstanceKey> {
        if !self.device.is_available() {
            handle.dispose();
            return None;
        }

        handle.play();
        let looping = handle.is_looping();
        let key = instances.insert(handle);

        self.transient_pool.push(key);
        if looping {
            self.looping_set.insert(key);
        }
        Some(key)
    }

    /// Hand ownership of an existing instance to the transient pool.
    ///
    /// Returns `false` in silent mode or if the key is already pooled.
    pub fn register_transient(&mut self, key: InstanceKey) -> bool {
        if !self.device.is_available() || self.transient_pool.contains(&key) {
            return false;
        }
        self.transient_pool.push(key);
        true
    }

    /// Add an instance to the loop-set.
    ///
    /// Returns `false` in silent mode or if the key is already present.
    pub fn register_looping(&mut self, key: InstanceKey) -> bool {
        self.device.is_available() && self.looping_set.insert(key)
    }

    /// Remove an instance from the loop-set.
    ///
    /// Returns `false` in silent mode or if the key was not present.
    pub fn unregister_looping(&mut self, key: InstanceKey) -> bool {
        self.device.is_available() && self.looping_set.remove(&key)
    }

    /// Forget every pooled and looping key without touching the instances
    pub fn clear(&mut self) {
        self.transient_pool.clear();
        self.looping_set.clear();
    }

    /// Release the output device.
    ///
    /// Only runs when the device is available unless `force` is set, which
    /// also releases whatever a failed acquisition left behind. Instances
    /// are left to their owner.
    pub fn dispose(&mut self, force: bool) {
        if self.device.is_available() || force {
            self.device.teardown();
            log::info!("Audio device released");
        }
    }

    /// Check if the output device is usable
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.device.is_available()
    }

    /// Check if a key is in the transient pool
    #[must_use]
    pub fn is_transient(&self, key: InstanceKey) -> bool {
        self.transient_pool.contains(&key)
    }

    /// Check if a key is in the loop-set
    #[must_use]
    pub fn is_looping(&self, key: InstanceKey) -> bool {
        self.looping_set.contains(&key)
    }

    /// Keys in the transient pool, oldest first
    #[must_use]
    pub fn transient(&self) -> &[InstanceKey] {
        &self.transient_pool
    }

    /// Number of keys in the transient pool
    #[must_use]
    pub fn transient_count(&self) -> usize {
        self.transient_pool.len()
    }

    /// Number of keys in the loop-set
    #[must_use]
    pub fn looping_count(&self) -> usize {
        self.looping_set.len()
    }

    /// Get a snapshot of the engine's bookkeeping
    #[must_use]
    pub fn stats(&self) -> AudioStats {
        AudioStats {
            available: self.is_available(),
            transient: self.transient_pool.len(),
            looping: self.looping_set.len(),
            ticks: self.ticks,
            disposed: self.disposed,
        }
    }

    /// Get the configuration the engine was created with
    #[must_use]
    pub const fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Get the owned device
    #[must_use]
    pub const fn device(&self) -> &AudioDevice<B> {
        &self.device
    }

    /// Get the backend
    #[must_use]
    pub const fn backend(&self) -> &B {
        self.device.backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CallStatus;
    use crate::audio::testing::{FailAt, FakeBackend, FakeHandle};

    use crate::audio::PlaybackState::{Paused, Playing, Stopped};

    fn engine() -> AudioEngine<FakeBackend> {
        AudioEngine::new(FakeBackend::new(), AudioConfig::default())
    }

    fn silent_engine() -> AudioEngine<FakeBackend> {
        AudioEngine::new(
            FakeBackend::failing(FailAt::CreateContext),
            AudioConfig::default(),
        )
    }

    fn pooled(
        engine: &mut AudioEngine<FakeBackend>,
        table: &mut InstanceTable<FakeHandle>,
        handle: FakeHandle,
    ) -> InstanceKey {
        let key = table.insert(handle);
        assert!(engine.register_transient(key));
        key
    }

    #[test]
    fn test_new_acquires_device() {
        let engine = engine();
        assert!(engine.is_available());
        assert!(engine.backend().current.is_some());
    }

    #[test]
    fn test_mixer_rate_applied_before_open() {
        let config = AudioConfig::default().with_mixer_output_rate(Some(44_100));
        let engine = AudioEngine::new(FakeBackend::new(), config);
        assert_eq!(engine.backend().mixer_rate, Some(44_100));
    }

    #[test]
    fn test_dispose_twice() {
        let mut engine = engine();

        engine.dispose(false);
        assert!(!engine.is_available());
        engine.dispose(false);
        assert!(!engine.is_available());
        engine.dispose(true);
        assert!(!engine.is_available());

        assert_eq!(engine.backend().devices_closed, 1);
        assert_eq!(engine.backend().contexts_destroyed, 1);
    }

    #[test]
    fn test_context_failure_leaves_nothing_acquired() {
        let engine = silent_engine();
        assert!(!engine.is_available());
        assert!(engine.device().device().is_none());
        assert!(engine.device().context().is_none());
        assert!(engine.backend().open_devices.is_empty());
    }

    #[test]
    fn test_forced_dispose_releases_partial_acquisition() {
        let mut engine = AudioEngine::new(
            FakeBackend::failing(FailAt::OpenStatus),
            AudioConfig::default(),
        );
        assert!(!engine.is_available());

        engine.dispose(false);
        assert_eq!(engine.backend().open_devices.len(), 1);

        engine.dispose(true);
        assert!(engine.backend().open_devices.is_empty());
    }

    #[test]
    fn test_silent_update_is_noop() {
        let mut engine = silent_engine();
        let mut table = InstanceTable::new();
        let stopped = FakeHandle::looping(Stopped);
        let counters = stopped.counters();
        let key = table.insert(stopped);

        assert!(!engine.register_transient(key));
        assert!(!engine.register_looping(key));

        for _ in 0..10 {
            engine.update(&mut table);
        }

        assert_eq!(engine.transient_count(), 0);
        assert_eq!(engine.looping_count(), 0);
        assert!(table.contains(key));
        assert_eq!(counters.disposed.get(), 0);
        assert_eq!(counters.loop_checks.get(), 0);
        assert_eq!(engine.stats().ticks, 0);
    }

    #[test]
    fn test_silent_play_transient_disposes_handle() {
        let mut engine = silent_engine();
        let mut table = InstanceTable::new();
        let handle = FakeHandle::new(Stopped);
        let counters = handle.counters();

        assert!(engine.play_transient(&mut table, handle).is_none());
        assert!(table.is_empty());
        assert_eq!(counters.disposed.get(), 1);
    }

    #[test]
    fn test_sweep_scenario() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        let a = FakeHandle::new(Stopped);
        let b = FakeHandle::new(Playing);
        let c = FakeHandle::new(Stopped);
        let (pa, pb, pc) = (a.counters(), b.counters(), c.counters());

        let ka = pooled(&mut engine, &mut table, a);
        let kb = pooled(&mut engine, &mut table, b);
        let kc = pooled(&mut engine, &mut table, c);

        engine.update(&mut table);

        assert_eq!(engine.transient(), &[kb]);
        assert!(!table.contains(ka));
        assert!(table.contains(kb));
        assert!(!table.contains(kc));
        assert_eq!(pa.disposed.get(), 1);
        assert_eq!(pb.disposed.get(), 0);
        assert_eq!(pc.disposed.get(), 1);
    }

    #[test]
    fn test_sweep_adjacent_stopped_entries() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        let states = [Stopped, Stopped, Playing, Stopped, Stopped, Paused, Stopped];
        let mut all_counters = Vec::new();
        let mut keys = Vec::new();
        for state in states {
            let handle = FakeHandle::new(state);
            all_counters.push(handle.counters());
            keys.push(pooled(&mut engine, &mut table, handle));
        }

        engine.update(&mut table);

        assert_eq!(engine.transient(), &[keys[2], keys[5]]);
        for (state, counters) in states.iter().zip(&all_counters) {
            let expected = u32::from(*state == Stopped);
            assert_eq!(counters.disposed.get(), expected);
        }
        assert_eq!(table.len(), 2);
        assert_eq!(engine.stats().disposed, 5);

        // Nothing left to release, counts must not change
        engine.update(&mut table);
        assert_eq!(engine.stats().disposed, 5);
        assert_eq!(all_counters.iter().map(|p| p.disposed.get()).sum::<u32>(), 5);
    }

    #[test]
    fn test_sweep_drops_keys_removed_by_owner() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        let handle = FakeHandle::new(Playing);
        let counters = handle.counters();
        let key = pooled(&mut engine, &mut table, handle);
        table.remove(key);

        engine.update(&mut table);
        assert_eq!(engine.transient_count(), 0);
        assert_eq!(counters.disposed.get(), 0);
    }

    #[test]
    fn test_loop_restart_within_same_update() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        let handle = FakeHandle::looping(Playing);
        let counters = handle.counters();
        let key = table.insert(handle);
        assert!(engine.register_looping(key));

        engine.update(&mut table);
        assert_eq!(counters.restarts.get(), 0);

        // Reaches its end between ticks
        table.get_mut(key).unwrap().state = Stopped;
        engine.update(&mut table);

        assert_eq!(counters.restarts.get(), 1);
        assert_eq!(table.get(key).unwrap().state, Playing);
        assert_eq!(counters.loop_checks.get(), 2);
        assert!(engine.is_looping(key), "Update never drops loop membership");
    }

    #[test]
    fn test_stopped_pooled_instance_purged_before_loop_pass() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        let handle = FakeHandle::new(Playing);
        let counters = handle.counters();
        let key = table.insert(handle);
        assert!(engine.register_transient(key));
        assert!(engine.register_looping(key));

        table.get_mut(key).unwrap().state = Stopped;
        engine.update(&mut table);

        assert!(!table.contains(key));
        assert_eq!(counters.disposed.get(), 1);
        assert_eq!(counters.loop_checks.get(), 0);
        assert_eq!(counters.restarts.get(), 0);
    }

    #[test]
    fn test_looping_pooled_instance_is_purged_not_restarted() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        let handle = FakeHandle::looping(Playing);
        let counters = handle.counters();
        let key = engine.play_transient(&mut table, handle).unwrap();
        assert!(engine.is_looping(key));

        table.get_mut(key).unwrap().state = Stopped;
        engine.update(&mut table);

        assert!(!table.contains(key));
        assert_eq!(counters.restarts.get(), 0);
    }

    #[test]
    fn test_released_looping_instances_leave_loop_set() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        for _ in 0..1000 {
            let key = engine
                .play_transient(&mut table, FakeHandle::looping(Playing))
                .unwrap();
            table.get_mut(key).unwrap().state = Stopped;
            engine.update(&mut table);
        }

        assert!(table.is_empty());
        assert_eq!(engine.transient_count(), 0);
        assert_eq!(engine.looping_count(), 0);
        assert_eq!(engine.stats().disposed, 1000);
    }

    #[test]
    fn test_loop_set_drops_keys_removed_by_owner() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        let handle = FakeHandle::looping(Playing);
        let counters = handle.counters();
        let removed = table.insert(handle);
        let kept = table.insert(FakeHandle::looping(Playing));
        assert!(engine.register_looping(removed));
        assert!(engine.register_looping(kept));

        table.remove(removed);
        engine.update(&mut table);

        assert!(!engine.is_looping(removed));
        assert!(engine.is_looping(kept));
        assert_eq!(engine.looping_count(), 1);
        assert_eq!(counters.loop_checks.get(), 0);
    }

    #[test]
    fn test_play_transient_starts_handle() {
        let mut engine = engine();
        let mut table = InstanceTable::new();

        let key = engine
            .play_transient(&mut table, FakeHandle::new(Stopped))
            .unwrap();

        assert_eq!(table.get(key).unwrap().state, Playing);
        assert!(engine.is_transient(key));
        assert!(!engine.is_looping(key));
    }

    #[test]
    fn test_register_is_deduplicated() {
        let mut engine = engine();
        let mut table = InstanceTable::new();
        let key = table.insert(FakeHandle::new(Playing));

        assert!(engine.register_transient(key));
        assert!(!engine.register_transient(key));
        assert!(engine.register_looping(key));
        assert!(!engine.register_looping(key));
        assert!(engine.unregister_looping(key));
        assert!(!engine.unregister_looping(key));
    }

    #[test]
    fn test_clear_keeps_instances() {
        let mut engine = engine();
        let mut table = InstanceTable::new();
        let key = engine
            .play_transient(&mut table, FakeHandle::looping(Playing))
            .unwrap();

        engine.clear();
        assert_eq!(engine.stats().transient, 0);
        assert_eq!(engine.stats().looping, 0);
        assert!(table.contains(key));
    }

    #[test]
    fn test_diagnostics_never_abort_tick() {
        let config = AudioConfig::default().with_diagnostics(true);
        let mut engine = AudioEngine::new(FakeBackend::new(), config);
        let mut table = InstanceTable::new();
        let handle = FakeHandle::new(Stopped);
        let counters = handle.counters();
        pooled(&mut engine, &mut table, handle);

        engine.device.backend_mut().pending_call_error = CallStatus::InvalidOperation;
        engine.update(&mut table);

        assert_eq!(counters.disposed.get(), 1);
        assert_eq!(engine.backend().pending_call_error, CallStatus::NoError);
    }

    #[test]
    fn test_update_after_dispose_is_noop() {
        let mut engine = engine();
        let mut table = InstanceTable::new();
        let handle = FakeHandle::new(Stopped);
        let counters = handle.counters();
        pooled(&mut engine, &mut table, handle);

        engine.dispose(false);
        engine.update(&mut table);

        assert_eq!(engine.transient_count(), 1);
        assert_eq!(counters.disposed.get(), 0);
    }
}
