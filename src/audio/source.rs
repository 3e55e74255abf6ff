//! Sound effects and their playing instances

use std::f32::consts::TAU;
use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::source::Buffered;
use rodio::{Sink, Source, mixer::Mixer};

use super::handle::{PlaybackHandle, PlaybackState};

/// Decoded, interleaved sample data shared by every instance playing it.
///
/// The samples are wrapped once in a buffered source; starting a playback
/// clones that source, which shares the decoded data instead of copying it.
#[derive(Clone)]
pub struct SoundEffect {
    name: String,
    channels: u16,
    sample_rate: u32,
    len: usize,
    source: Buffered<SamplesBuffer>,
}

impl SoundEffect {
    /// Wrap already decoded interleaved samples
    pub fn from_samples(
        name: impl Into<String>,
        channels: u16,
        sample_rate: u32,
        samples: impl Into<Vec<f32>>,
    ) -> Self {
        let channels = channels.max(1);
        let sample_rate = sample_rate.max(1);
        let samples = samples.into();

        Self {
            name: name.into(),
            channels,
            sample_rate,
            len: samples.len(),
            source: SamplesBuffer::new(channels, sample_rate, samples).buffered(),
        }
    }

    /// Generate a mono sine tone
    pub fn tone(
        name: impl Into<String>,
        frequency: f32,
        duration: Duration,
        sample_rate: u32,
    ) -> Self {
        let count = (duration.as_secs_f32() * sample_rate as f32) as usize;
        let samples: Vec<f32> = (0..count)
            .map(|i| (TAU * frequency * i as f32 / sample_rate as f32).sin() * 0.2)
            .collect();
        Self::from_samples(name, 1, sample_rate, samples)
    }

    /// Get the effect name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the channel count
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Get the sample rate in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the playback length
    #[must_use]
    pub fn duration(&self) -> Duration {
        let frames = self.len / usize::from(self.channels);
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    fn source(&self) -> Buffered<SamplesBuffer> {
        self.source.clone()
    }
}

impl std::fmt::Debug for SoundEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEffect")
            .field("name", &self.name)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("len", &self.len)
            .finish()
    }
}

/// One playback of a [`SoundEffect`] through a rodio sink.
///
/// Every start gets a fresh sink on the mixer, so stopping never has to
/// wait for queued audio to drain. The sink has no native looping here: a
/// looping instance that drains is reported as stopped until
/// [`check_loop`](PlaybackHandle::check_loop) starts it again.
pub struct SoundInstance {
    /// `None` once disposed
    mixer: Option<Mixer>,
    /// `None` while stopped
    sink: Option<Sink>,
    effect: SoundEffect,
    state: PlaybackState,
    looping: bool,
    volume: f32,
}

impl SoundInstance {
    /// Create a stopped instance that plays through a mixer
    pub fn new(mixer: &Mixer, effect: &SoundEffect) -> Self {
        Self {
            mixer: Some(mixer.clone()),
            sink: None,
            effect: effect.clone(),
            state: PlaybackState::Stopped,
            looping: false,
            volume: 1.0,
        }
    }

    /// Pause the audio
    pub fn pause(&mut self) {
        if let Some(sink) = &self.sink
            && self.state() == PlaybackState::Playing
        {
            sink.pause();
            self.state = PlaybackState::Paused;
        }
    }

    /// Resume paused audio
    pub fn resume(&mut self) {
        if let Some(sink) = &self.sink
            && self.state == PlaybackState::Paused
        {
            sink.play();
            self.state = PlaybackState::Playing;
        }
    }

    /// Stop the audio. A stopped looping instance is not restarted.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.state = PlaybackState::Stopped;
    }

    /// Set the volume (0.0 = silent, 1.0 = normal, >1.0 = amplified)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    /// Get the current volume
    #[must_use]
    pub const fn volume(&self) -> f32 {
        self.volume
    }

    /// Enable or disable looping
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Get the effect being played
    #[must_use]
    pub const fn effect(&self) -> &SoundEffect {
        &self.effect
    }

    /// Check if the instance has been disposed
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.mixer.is_none()
    }

    fn reached_end(&self) -> bool {
        self.state == PlaybackState::Playing && self.sink.as_ref().is_none_or(Sink::empty)
    }
}

impl PlaybackHandle for SoundInstance {
    fn state(&self) -> PlaybackState {
        if self.reached_end() {
            PlaybackState::Stopped
        } else {
            self.state
        }
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn play(&mut self) {
        let Some(mixer) = &self.mixer else {
            return;
        };
        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let sink = Sink::connect_new(mixer);
        sink.set_volume(self.volume);
        sink.append(self.effect.source());
        self.sink = Some(sink);
        self.state = PlaybackState::Playing;
    }

    fn dispose(&mut self) {
        self.stop();
        if self.mixer.take().is_some() {
            log::trace!("Disposed instance of '{}'", self.effect.name);
        }
    }

    fn check_loop(&mut self) {
        if self.looping && self.reached_end() {
            self.play();
        }
    }
}

impl Drop for SoundInstance {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for SoundInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundInstance")
            .field("effect", &self.effect.name)
            .field("state", &self.state)
            .field("looping", &self.looping)
            .field("volume", &self.volume)
            .finish()
    }
}
