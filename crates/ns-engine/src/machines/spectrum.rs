//! Passthrough with a spectrum analyser on the side.

use ns_ir::{AnyParam, AudioBlock, SAMPLE_RATE};

use crate::component::UpdateContext;
use crate::dsp::SpectrumAnalyzer;
use crate::machine::{Machine, MachineInfo, PortInfo};

static INFO: MachineInfo = MachineInfo {
    kind: "Spectrum",
    inputs: &[PortInfo::audio("in")],
    outputs: &[PortInfo::audio("out")],
};

const FFT_SIZE: usize = 1024;
const BANDS: usize = 32;
const SMOOTHING: f32 = 0.15;

pub struct Spectrum {
    analyzer: SpectrumAnalyzer,
    input: AudioBlock,
}

impl Default for Spectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Spectrum {
    pub fn new() -> Self {
        Self {
            analyzer: SpectrumAnalyzer::new(FFT_SIZE, BANDS, SMOOTHING, SAMPLE_RATE as f32),
            input: AudioBlock::new(),
        }
    }
}

impl Machine for Spectrum {
    fn info(&self) -> &'static MachineInfo {
        &INFO
    }

    fn params(&self) -> &[AnyParam] {
        &[]
    }

    fn params_mut(&mut self) -> &mut [AnyParam] {
        &mut []
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        ctx.read_audio(0, &mut self.input);
        for x in self.input.iter() {
            self.analyzer.push(x.to_mono());
        }
        if let Some(out) = ctx.audio_out(0) {
            out.as_mut_slice().copy_from_slice(self.input.as_slice());
        }
    }

    /// Smoothed magnitudes of 32 log-spaced bands.
    fn visual(&self) -> Option<&[f32]> {
        Some(self.analyzer.bands())
    }

    fn reset(&mut self) {
        self.analyzer.clear();
    }
}
