//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! Each effect is a short list of oscillator voices; playback only exists on wasm32.

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// One oscillator with an exponential decay envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub wave: Waveform,
    /// Start frequency (Hz)
    pub freq: f32,
    /// Frequency glided to over the voice's duration, if any
    pub end_freq: Option<f32>,
    /// Peak gain relative to the effect volume
    pub gain: f32,
    /// Start offset (seconds)
    pub delay: f64,
    /// Decay time (seconds)
    pub duration: f64,
}

impl Voice {
    const fn new(wave: Waveform, freq: f32, gain: f32, duration: f64) -> Self {
        Self {
            wave,
            freq,
            end_freq: None,
            gain,
            delay: 0.0,
            duration,
        }
    }

    const fn glide(mut self, end_freq: f32) -> Self {
        self.end_freq = Some(end_freq);
        self
    }

    const fn at(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Two balls (or a ball and a wall) knock together
    Clack,
    /// One countdown step
    CountdownTick,
    /// Fresh balls dropped in
    Respawn,
    /// Settings toggle
    Toggle,
}

const CLACK: &[Voice] = &[
    Voice::new(Waveform::Triangle, 900.0, 0.35, 0.05).glide(500.0),
    Voice::new(Waveform::Sine, 180.0, 0.25, 0.06),
];

const COUNTDOWN_TICK: &[Voice] = &[Voice::new(Waveform::Sine, 660.0, 0.3, 0.15)];

const RESPAWN: &[Voice] = &[
    Voice::new(Waveform::Triangle, 440.0, 0.3, 0.2).at(0.0),
    Voice::new(Waveform::Triangle, 550.0, 0.3, 0.2).at(0.08),
    Voice::new(Waveform::Triangle, 660.0, 0.3, 0.3).at(0.16),
    Voice::new(Waveform::Sine, 880.0, 0.2, 0.4).at(0.24),
];

const TOGGLE: &[Voice] = &[Voice::new(Waveform::Square, 1200.0, 0.08, 0.03)];

impl SoundEffect {
    pub fn voices(self) -> &'static [Voice] {
        match self {
            SoundEffect::Clack => CLACK,
            SoundEffect::CountdownTick => COUNTDOWN_TICK,
            SoundEffect::Respawn => RESPAWN,
            SoundEffect::Toggle => TOGGLE,
        }
    }

    /// Time until the last voice has faded (seconds)
    #[cfg(test)]
    fn length(self) -> f64 {
        self.voices()
            .iter()
            .map(|v| v.delay + v.duration)
            .fold(0.0, f64::max)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{SoundEffect, Voice, Waveform};

    impl From<Waveform> for OscillatorType {
        fn from(wave: Waveform) -> Self {
            match wave {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Triangle => OscillatorType::Triangle,
                Waveform::Square => OscillatorType::Square,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            }
        }
    }

    /// Audio manager for the toy
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Play an effect at `volume` (0.0 - 1.0, scaled by master volume)
        pub fn play(&self, effect: SoundEffect, volume: f32) {
            let vol = self.master_volume * volume.clamp(0.0, 1.0);
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            for voice in effect.voices() {
                self.play_voice(ctx, voice, vol);
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_voice(&self, ctx: &AudioContext, voice: &Voice, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, voice.freq, voice.wave.into()) else {
                return;
            };
            let t = ctx.current_time() + voice.delay;

            gain.gain().set_value_at_time(vol * voice.gain, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + voice.duration)
                .ok();
            if let Some(end) = voice.end_freq {
                osc.frequency().set_value_at_time(voice.freq, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(end, t + voice.duration)
                    .ok();
            }

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + voice.duration + 0.02).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_effect_has_audible_voices() {
        for effect in [
            SoundEffect::Clack,
            SoundEffect::CountdownTick,
            SoundEffect::Respawn,
            SoundEffect::Toggle,
        ] {
            let voices = effect.voices();
            assert!(!voices.is_empty());
            for v in voices {
                assert!(v.freq > 20.0 && v.freq < 20_000.0);
                assert!(v.gain > 0.0 && v.gain <= 1.0);
                assert!(v.duration > 0.0);
                // exponential ramps cannot target zero
                assert!(v.end_freq.is_none_or(|f| f > 0.0));
            }
        }
    }

    #[test]
    fn test_clack_is_short() {
        assert!(SoundEffect::Clack.length() < 0.1);
        assert!(SoundEffect::Respawn.length() > SoundEffect::CountdownTick.length());
    }
}
