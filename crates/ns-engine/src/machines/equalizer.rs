//! Stereo biquad equalizer band.

use ns_ir::{AnyParam, AudioBlock, Parameter, Sample};

use crate::component::UpdateContext;
use crate::dsp::{Biquad, BiquadMode, Coefficients};
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Equalizer",
    inputs: &[PortInfo::audio("in")],
    outputs: &[PortInfo::audio("out")],
};

const MODE: usize = 0;
const FREQUENCY: usize = 1;
const Q: usize = 2;
const GAIN: usize = 3;

/// Coefficients are only redesigned when a parameter changed.
pub struct Equalizer {
    params: Vec<AnyParam>,
    left: Biquad,
    right: Biquad,
    designed: Option<(BiquadMode, f32, f32, f32)>,
    input: AudioBlock,
}

impl Default for Equalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Equalizer {
    pub fn new() -> Self {
        Self {
            params: vec![
                Parameter::new("mode", 0, 7, 4).with_options(&[0, 1, 2, 3, 4, 5, 6, 7]).into(),
                Parameter::new("frequency", 20.0f32, 20_000.0, 1_000.0).logarithmic().into(),
                Parameter::new("q", 0.1f32, 10.0, 0.707).into(),
                Parameter::new("gain", 0.0f32, 4.0, 1.0).into(),
            ],
            left: Biquad::new(),
            right: Biquad::new(),
            designed: None,
            input: AudioBlock::new(),
        }
    }

    fn redesign(&mut self, sample_rate: f32) {
        let wanted = (
            BiquadMode::from_index(self.params[MODE].as_i32()),
            self.params[FREQUENCY].as_f32(),
            self.params[Q].as_f32(),
            self.params[GAIN].as_f32(),
        );
        if self.designed == Some(wanted) {
            return;
        }
        let (mode, frequency, q, gain) = wanted;
        let coeffs = Coefficients::design(mode, frequency, q, gain, sample_rate);
        self.left.set_coefficients(coeffs);
        self.right.set_coefficients(coeffs);
        self.designed = Some(wanted);
    }
}

impl Machine for Equalizer {
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
        self.redesign(ctx.transport.sample_rate());
        ctx.read_audio(0, &mut self.input);
        if let Some(out) = ctx.audio_out(0) {
            for (y, x) in out.iter_mut().zip(self.input.iter()) {
                *y = Sample::new(self.left.process(x.left), self.right.process(x.right));
            }
        }
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
    }
}
