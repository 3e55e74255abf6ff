//! Headless host loop driving the audio engine once per tick

use std::time::{Duration, Instant};

use crate::audio::{
    AudioBackend, AudioConfig, AudioEngine, InstanceKey, InstanceTable, PlaybackHandle,
    SharedAudioEngine, SoundInstance,
};
use crate::core::Time;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application name used in log output
    pub title: String,
    /// Target ticks per second (0 for unlimited)
    pub target_fps: u32,
    /// Stop after this many ticks
    pub max_ticks: Option<u64>,
    /// Audio output settings
    pub audio: AudioConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: String::from("Engine"),
            target_fps: 60,
            max_ticks: None,
            audio: AudioConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with a title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Stop the loop after a fixed number of ticks
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Set the audio output settings
    pub fn with_audio(mut self, audio: AudioConfig) -> Self {
        self.audio = audio;
        self
    }
}

/// Application callbacks driven by [`Engine`]
pub trait App<B: AudioBackend, H: PlaybackHandle = SoundInstance> {
    /// Called once before the first tick
    fn init(&mut self, ctx: &mut EngineContext<B, H>);

    /// Called every tick, before audio maintenance
    fn update(&mut self, ctx: &mut EngineContext<B, H>);

    /// Called once after the last tick, before audio shuts down
    fn shutdown(&mut self, _ctx: &mut EngineContext<B, H>) {}
}

/// Context passed to application callbacks
pub struct EngineContext<B: AudioBackend, H: PlaybackHandle = SoundInstance> {
    /// Time tracking
    pub time: Time,
    /// Sound instances owned by the application
    pub instances: InstanceTable<H>,
    audio: SharedAudioEngine<B>,
    should_quit: bool,
}

impl<B: AudioBackend, H: PlaybackHandle> EngineContext<B, H> {
    fn new(config: &EngineConfig, backend: fn() -> B) -> Self {
        Self {
            time: Time::new(),
            instances: InstanceTable::with_capacity(config.audio.pool_capacity),
            audio: SharedAudioEngine::new(config.audio.clone(), backend),
            should_quit: false,
        }
    }

    /// Get the audio engine, acquiring the device on first access
    pub fn audio(&mut self) -> &mut AudioEngine<B> {
        self.audio.get_mut()
    }

    /// Play a fire-and-forget instance
    pub fn play(&mut self, handle: H) -> Option<InstanceKey> {
        self.audio.get_mut().play_transient(&mut self.instances, handle)
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if engine should quit
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Main engine struct
pub struct Engine<A, B, H = SoundInstance>
where
    A: App<B, H>,
    B: AudioBackend,
    H: PlaybackHandle,
{
    config: EngineConfig,
    app: A,
    context: EngineContext<B, H>,
}

impl<A, B, H> Engine<A, B, H>
where
    A: App<B, H>,
    B: AudioBackend,
    H: PlaybackHandle,
{
    /// Create a new engine. The audio device is acquired on first use.
    pub fn new(config: EngineConfig, app: A, backend: fn() -> B) -> Self {
        let context = EngineContext::new(&config, backend);
        Self {
            config,
            app,
            context,
        }
    }

    /// Run until the app quits or the tick limit is reached.
    ///
    /// Returns the app so its final state can be inspected.
    pub fn run(mut self) -> A {
        let _ = env_logger::try_init();
        log::info!("Starting engine: {}", self.config.title);

        let frame_budget = (self.config.target_fps > 0)
            .then(|| Duration::from_secs_f64(1.0 / f64::from(self.config.target_fps)));

        self.app.init(&mut self.context);

        loop {
            let frame_start = Instant::now();
            self.context.time.update();

            self.app.update(&mut self.context);

            let EngineContext {
                audio, instances, ..
            } = &mut self.context;
            audio.get_mut().update(instances);

            let limit_reached = self
                .config
                .max_ticks
                .is_some_and(|max| self.context.time.frame_count() >= max);
            if self.context.should_quit() || limit_reached {
                break;
            }

            if let Some(budget) = frame_budget {
                let elapsed = frame_start.elapsed();
                if elapsed < budget {
                    std::thread::sleep(budget - elapsed);
                }
            }
        }

        self.app.shutdown(&mut self.context);
        self.context.audio.shutdown();
        log::info!(
            "Engine stopped after {} ticks",
            self.context.time.frame_count()
        );

        self.app
    }
}
