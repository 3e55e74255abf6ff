//! Example application demonstrating the audio engine

use std::time::Duration;

use audio_core::prelude::*;

/// Plays a short beep every half second over a looping hum
struct DemoApp {
    beep: SoundEffect,
    hum: SoundEffect,
    hum_key: Option<InstanceKey>,
    since_beep: f32,
}

impl DemoApp {
    fn new() -> Self {
        Self {
            beep: SoundEffect::tone("beep", 880.0, Duration::from_millis(120), 44_100),
            hum: SoundEffect::tone("hum", 110.0, Duration::from_millis(400), 44_100),
            hum_key: None,
            since_beep: 0.0,
        }
    }
}

impl App<RodioBackend> for DemoApp {
    fn init(&mut self, ctx: &mut EngineContext<RodioBackend>) {
        log::info!("Initializing audio demo");

        let Some(mixer) = ctx.audio().backend().mixer() else {
            log::warn!("Audio unavailable, the demo will run silent");
            return;
        };

        let mut hum = SoundInstance::new(mixer, &self.hum);
        hum.set_looping(true);
        hum.set_volume(0.5);
        hum.play();

        let key = ctx.instances.insert(hum);
        ctx.audio().register_looping(key);
        self.hum_key = Some(key);
    }

    fn update(&mut self, ctx: &mut EngineContext<RodioBackend>) {
        self.since_beep += ctx.time.delta_seconds();
        if self.since_beep < 0.5 {
            return;
        }
        self.since_beep = 0.0;

        let beep = ctx
            .audio()
            .backend()
            .mixer()
            .map(|mixer| SoundInstance::new(mixer, &self.beep));
        if let Some(beep) = beep {
            ctx.play(beep);
        }

        let stats = ctx.audio().stats();
        log::info!(
            "Transient: {} | Looping: {} | Released: {}",
            stats.transient,
            stats.looping,
            stats.disposed
        );
    }

    fn shutdown(&mut self, ctx: &mut EngineContext<RodioBackend>) {
        if let Some(key) = self.hum_key.take() {
            ctx.audio().unregister_looping(key);
            if let Some(mut hum) = ctx.instances.remove(key) {
                hum.dispose();
            }
        }
    }
}

fn main() {
    let config = EngineConfig::default()
        .with_title("Audio Demo")
        .with_target_fps(60)
        .with_max_ticks(240);

    let engine: Engine<DemoApp, RodioBackend> =
        Engine::new(config, DemoApp::new(), RodioBackend::new);
    engine.run();
}
