//! Playback handle contract shared by every sound instance type

/// Playback state of a sound instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Audio is playing
    Playing,
    /// Audio is paused
    Paused,
    /// Audio has stopped, either explicitly or by reaching its end
    #[default]
    Stopped,
}

/// A single active or recently finished playback.
///
/// The engine only observes handles through this trait. It never decodes,
/// buffers or mixes anything itself.
pub trait PlaybackHandle {
    /// Current playback state
    fn state(&self) -> PlaybackState;

    /// Whether the playback should restart when it reaches its end
    fn is_looping(&self) -> bool;

    /// Start (or restart) playback from the beginning
    fn play(&mut self);

    /// Release the native resources behind this playback.
    ///
    /// Must tolerate being called on an already disposed handle.
    fn dispose(&mut self);

    /// Restart playback if it reached its end naturally while looping
    fn check_loop(&mut self);
}
