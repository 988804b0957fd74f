//! Polyphonic sample playback.

use ns_ir::{AnyParam, Parameter, SampleKey, BLOCK_SIZE};

use super::{adhsr_params, read_adhsr, sorted_events};
use crate::component::UpdateContext;
use crate::frequency::semitone_ratio;
use crate::machine::{Machine, MachineInfo, PortInfo};
use crate::voice::VoiceTracker;

static INFO: MachineInfo = MachineInfo {
    kind: "Sampler",
    inputs: &[PortInfo::midi("notes")],
    outputs: &[PortInfo::audio("out")],
};

const ROOT: usize = 0;
const ENVELOPE: usize = 1;
const VOLUME: usize = 6;

/// Plays the attached asset at a rate relative to `root`. Without an asset,
/// or with an empty one, it stays silent.
pub struct Sampler {
    params: Vec<AnyParam>,
    voices: VoiceTracker,
    sample: Option<SampleKey>,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler {
    pub fn new() -> Self {
        let mut params: Vec<AnyParam> = vec![Parameter::new("root", 0, 127, 60).into()];
        params.extend(adhsr_params());
        params.push(Parameter::new("volume", 0.0f32, 1.0, 0.8).into());
        // One-shot friendly default: full level until release.
        params[ENVELOPE].set_value(0.0);
        params[ENVELOPE + 3].set_value(1.0);
        Self { params, voices: VoiceTracker::new(), sample: None }
    }
}

impl Machine for Sampler {
    fn info(&self) -> &'static MachineInfo {
        &INFO
    }

    fn params(&self) -> &[AnyParam] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [AnyParam] {
        &mut self.params
    }

    fn attach_sample(&mut self, key: SampleKey) -> bool {
        self.sample = Some(key);
        self.voices.clear();
        true
    }

    fn sample(&self) -> Option<SampleKey> {
        self.sample
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let events = sorted_events(ctx, 0);
        self.voices.handle_events(&events, &ctx.transport);

        let root = self.params[ROOT].as_i32();
        let env = read_adhsr(&self.params[ENVELOPE..]);
        let volume = self.params[VOLUME].as_f32();
        let sps = ctx.transport.steps_per_sample();
        let start = ctx.transport.block_start;
        let end = start + BLOCK_SIZE as u64;

        let samples = ctx.samples;
        let Some(asset) = self.sample.and_then(|key| samples.get(key)) else {
            self.voices.reap(&env, end, sps);
            return;
        };
        let frames = asset.len() as f64;

        if let Some(out) = ctx.audio_out(0) {
            for voice in self.voices.voices() {
                let rate = semitone_ratio((voice.note as i32 - root) as f32) as f64;
                let gain = voice.velocity * volume;
                for i in 0..BLOCK_SIZE {
                    let Some(n) = voice.elapsed(start + i as u64) else {
                        continue;
                    };
                    let amp = voice.amplitude(&env, n as f64 * sps);
                    out[i] += asset.frame_at(n as f64 * rate) * (amp * gain);
                }
            }
        }

        self.voices.reap(&env, end, sps);
        self.voices.retain(|v| {
            let rate = semitone_ratio((v.note as i32 - root) as f32) as f64;
            v.elapsed(end).map_or(true, |n| (n as f64 * rate) < frames)
        });
    }

    fn reset(&mut self) {
        self.voices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::PortRef;
    use crate::driver::Engine;
    use ns_ir::{ComponentId, NoteEvent, Sample, SampleAsset};
    use slotmap::SlotMap;

    #[test]
    fn accepts_samples() {
        let mut bank: SlotMap<SampleKey, SampleAsset> = SlotMap::with_key();
        let key = bank.insert(SampleAsset::empty("blank"));
        let mut sampler = Sampler::new();
        assert!(sampler.attach_sample(key));
        assert_eq!(sampler.sample(), Some(key));
    }

    /// Frame `i` is `i / 100` on both channels.
    fn ramp(len: usize) -> SampleAsset {
        SampleAsset::new("ramp", (0..len).map(|i| Sample::mono(i as f32 / 100.0)).collect())
    }

    /// Keyboard into a unity-volume sampler holding `asset`.
    fn keyed(asset: Option<SampleAsset>) -> (Engine, ComponentId) {
        let mut engine = Engine::new();
        engine.set_master_volume(1.0);
        let g = engine.graph_mut();
        let keys = g.add_component("Keyboard").unwrap();
        let sampler = g.add_component("Sampler").unwrap();
        let speaker = g.add_component("Speaker").unwrap();
        g.set_param(sampler, "volume", 1.0);
        assert!(g.connect(PortRef::new(keys, 0), PortRef::new(sampler, 0), 1.0));
        assert!(g.connect(PortRef::new(sampler, 0), PortRef::new(speaker, 0), 1.0));
        if let Some(asset) = asset {
            let key = g.add_sample(asset);
            assert!(g.attach_sample(sampler, key));
        }
        (engine, sampler)
    }

    fn play(engine: &mut Engine, note: u8) -> Vec<f32> {
        assert!(engine.push_event(NoteEvent::press(0, note, 1.0)));
        engine.render_block().iter().map(|s| s.left).collect()
    }

    #[test]
    fn root_note_plays_frames_as_recorded() {
        let (mut engine, _) = keyed(Some(ramp(100)));
        let out = play(&mut engine, 60);
        for i in 0..100 {
            assert!((out[i] - i as f32 / 100.0).abs() < 1e-6, "frame {i}");
        }
        assert!(out[100..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn octave_up_skips_frames() {
        let (mut engine, _) = keyed(Some(ramp(100)));
        let out = play(&mut engine, 72);
        assert!((out[10] - 0.2).abs() < 1e-5);
        assert!((out[49] - 0.98).abs() < 1e-5);
        assert!(out[50..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn octave_down_interpolates() {
        let (mut engine, id) = keyed(Some(ramp(100)));
        engine.graph_mut().set_param(id, "root", 72.0);
        let out = play(&mut engine, 60);
        assert!((out[1] - 0.005).abs() < 1e-5);
        assert!((out[3] - 0.015).abs() < 1e-5);
        assert!((out[198] - 0.99).abs() < 1e-5);
    }

    #[test]
    fn voice_is_reaped_at_the_end_of_the_asset() {
        let (mut engine, _) = keyed(Some(ramp(100)));
        play(&mut engine, 60);
        // Still held, but the asset ran out: the same note must sound again.
        let again = play(&mut engine, 60);
        assert!((again[50] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_or_missing_asset_is_silent() {
        for asset in [Some(SampleAsset::empty("blank")), None] {
            let (mut engine, _) = keyed(asset);
            let out = play(&mut engine, 60);
            assert!(out.iter().all(|&x| x == 0.0));
        }
    }
}
