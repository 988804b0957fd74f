//! Polyphonic oscillator voice machine.

use core::f64::consts::TAU;

use ns_ir::{AnyParam, Parameter, Sample, BLOCK_SIZE, SAMPLE_RATE};

use super::{adhsr_params, read_adhsr, sorted_events};
use crate::component::UpdateContext;
use crate::frequency::note_to_frequency;
use crate::machine::{Machine, MachineInfo, PortInfo};
use crate::voice::VoiceTracker;

static INFO: MachineInfo = MachineInfo {
    kind: "Synth",
    inputs: &[PortInfo::midi("notes")],
    outputs: &[PortInfo::audio("out")],
};

const WAVEFORM: usize = 0;
const ENVELOPE: usize = 1;
const VOLUME: usize = 6;

/// Oscillator shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Waveform {
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Waveform::Saw,
            2 => Waveform::Square,
            3 => Waveform::Triangle,
            _ => Waveform::Sine,
        }
    }

    /// Value at `phase` cycles, `phase` in [0, 1).
    #[inline]
    pub fn value(self, phase: f64) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin() as f32,
            Waveform::Saw => (2.0 * phase - 1.0) as f32,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => (1.0 - 4.0 * (phase - 0.5).abs()) as f32,
        }
    }
}

/// Each voice's phase is derived from the samples elapsed since its onset,
/// so voices carry no oscillator state.
pub struct Synth {
    params: Vec<AnyParam>,
    voices: VoiceTracker,
}

impl Default for Synth {
    fn default() -> Self {
        Self::new()
    }
}

impl Synth {
    pub fn new() -> Self {
        let mut params: Vec<AnyParam> =
            vec![Parameter::new("waveform", 0, 3, 0).with_options(&[0, 1, 2, 3]).into()];
        params.extend(adhsr_params());
        params.push(Parameter::new("volume", 0.0f32, 1.0, 0.5).into());
        Self { params, voices: VoiceTracker::new() }
    }

    pub fn voices(&self) -> &VoiceTracker {
        &self.voices
    }
}

impl Machine for Synth {
    fn info(&self) -> &'static MachineInfo {
        &INFO
    }

    fn params(&self) -> &[AnyParam] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [AnyParam] {
        &mut self.params
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let events = sorted_events(ctx, 0);
        self.voices.handle_events(&events, &ctx.transport);

        let waveform = Waveform::from_index(self.params[WAVEFORM].as_i32());
        let env = read_adhsr(&self.params[ENVELOPE..]);
        let volume = self.params[VOLUME].as_f32();
        let sps = ctx.transport.steps_per_sample();
        let start = ctx.transport.block_start;

        if let Some(out) = ctx.audio_out(0) {
            for voice in self.voices.voices() {
                let cycles_per_sample = note_to_frequency(voice.note) as f64 / SAMPLE_RATE as f64;
                let gain = voice.velocity * volume;
                for i in 0..BLOCK_SIZE {
                    let Some(n) = voice.elapsed(start + i as u64) else {
                        continue;
                    };
                    let amp = voice.amplitude(&env, n as f64 * sps);
                    let phase = (cycles_per_sample * n as f64).fract();
                    out[i] += Sample::mono(waveform.value(phase) * amp * gain);
                }
            }
        }

        self.voices.reap(&env, start + BLOCK_SIZE as u64, sps);
    }

    fn reset(&mut self) {
        self.voices.clear();
    }
}
