//! Built-in machine implementations and the kind registry.

mod delay;
mod equalizer;
mod filter;
mod gate;
mod keyboard;
mod reverb;
mod sampler;
mod sequencer;
mod spectrum;
mod speaker;
mod synth;

pub use delay::Delay;
pub use equalizer::Equalizer;
pub use filter::Filter;
pub use gate::Gate;
pub use keyboard::Keyboard;
pub use reverb::Reverb;
pub use sampler::Sampler;
pub use sequencer::Sequencer;
pub use spectrum::Spectrum;
pub use speaker::Speaker;
pub use synth::{Synth, Waveform};

use ns_ir::{AnyParam, EventList, Parameter};

use crate::component::UpdateContext;
use crate::dsp::Adhsr;
use crate::machine::Machine;

/// Every kind name `create_machine` understands.
pub const KINDS: &[&str] = &[
    "Speaker",
    "Keyboard",
    "Sequencer",
    "Synth",
    "Sampler",
    "Gate",
    "Filter",
    "Equalizer",
    "Delay",
    "Reverb",
    "Spectrum",
];

/// Create a machine by kind name. `None` for unknown kinds.
pub fn create_machine(kind: &str) -> Option<Box<dyn Machine>> {
    Some(match kind {
        "Speaker" => Box::new(Speaker::new()),
        "Keyboard" => Box::new(Keyboard::new()),
        "Sequencer" => Box::new(Sequencer::new()),
        "Synth" => Box::new(Synth::new()),
        "Sampler" => Box::new(Sampler::new()),
        "Gate" => Box::new(Gate::new()),
        "Filter" => Box::new(Filter::new()),
        "Equalizer" => Box::new(Equalizer::new()),
        "Delay" => Box::new(Delay::new()),
        "Reverb" => Box::new(Reverb::new()),
        "Spectrum" => Box::new(Spectrum::new()),
        _ => return None,
    })
}

/// The five envelope parameters, in `Adhsr` field order.
pub(crate) fn adhsr_params() -> [AnyParam; 5] {
    let d = Adhsr::default();
    [
        Parameter::new("attack", 0.0, 16.0, d.attack).into(),
        Parameter::new("hold", 0.0, 16.0, d.hold).into(),
        Parameter::new("decay", 0.0, 16.0, d.decay).into(),
        Parameter::new("sustain", 0.0, 1.0, d.sustain).into(),
        Parameter::new("release", 0.0, 16.0, d.release).into(),
    ]
}

/// Read an envelope laid out by [`adhsr_params`] starting at `params[0]`.
pub(crate) fn read_adhsr(params: &[AnyParam]) -> Adhsr {
    let get = |i: usize| params.get(i).map_or(0.0, AnyParam::as_f32);
    Adhsr { attack: get(0), hold: get(1), decay: get(2), sustain: get(3), release: get(4) }
}

/// Events of a MIDI input in replay order.
pub(crate) fn sorted_events(ctx: &UpdateContext<'_>, input: usize) -> EventList {
    let mut events = EventList::new();
    ctx.read_events(input, &mut events);
    events.sort_unstable();
    events
}

/// Signal sources and a small rig for exercising one machine at a time.
#[cfg(test)]
pub(crate) mod testing {
    use std::f32::consts::TAU;

    use ns_ir::{AnyParam, ComponentId, Sample, SAMPLE_RATE};

    use crate::component::UpdateContext;
    use crate::connector::PortRef;
    use crate::driver::Engine;
    use crate::graph::Graph;
    use crate::machine::{Machine, MachineInfo, PortInfo};

    static SOURCE_INFO: MachineInfo = MachineInfo {
        kind: "TestSource",
        inputs: &[],
        outputs: &[PortInfo::audio("out")],
    };

    #[derive(Clone, Copy, Debug)]
    pub(crate) enum Signal {
        /// A single full-scale sample at time zero.
        Impulse,
        /// Half-scale sine at the given frequency.
        Sine(f32),
        /// The same value on every sample.
        Constant(f32),
    }

    struct Source {
        signal: Signal,
        n: u64,
    }

    impl Machine for Source {
        fn info(&self) -> &'static MachineInfo {
            &SOURCE_INFO
        }

        fn params(&self) -> &[AnyParam] {
            &[]
        }

        fn params_mut(&mut self) -> &mut [AnyParam] {
            &mut []
        }

        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            let Some(out) = ctx.audio_out(0) else {
                return;
            };
            for y in out.iter_mut() {
                let value = match self.signal {
                    Signal::Impulse if self.n == 0 => 1.0,
                    Signal::Impulse => 0.0,
                    Signal::Sine(freq) => {
                        let t = self.n as f32 / SAMPLE_RATE as f32;
                        0.5 * (TAU * freq * t).sin()
                    }
                    Signal::Constant(value) => value,
                };
                *y = Sample::mono(value);
                self.n += 1;
            }
        }
    }

    /// `signal` into a machine of `kind` into a speaker, at unity volume.
    pub(crate) struct Rig {
        pub engine: Engine,
        pub id: ComponentId,
    }

    impl Rig {
        pub fn new(kind: &str, signal: Signal) -> Self {
            let mut graph = Graph::new();
            let source = graph.add_machine(Box::new(Source { signal, n: 0 }));
            let id = graph.add_component(kind).unwrap();
            let speaker = graph.add_component("Speaker").unwrap();
            assert!(graph.connect(PortRef::new(source, 0), PortRef::new(id, 0), 1.0));
            assert!(graph.connect(PortRef::new(id, 0), PortRef::new(speaker, 0), 1.0));
            let mut engine = Engine::with_graph(graph);
            engine.set_master_volume(1.0);
            Self { engine, id }
        }

        pub fn set(&mut self, name: &str, value: f64) -> &mut Self {
            assert!(self.engine.graph_mut().set_param(self.id, name, value), "{name}");
            self
        }

        /// Render `blocks` blocks and flatten them into one buffer.
        pub fn run(&mut self, blocks: usize) -> Vec<Sample> {
            self.engine.render_blocks(blocks).iter().flat_map(|b| b.iter().copied()).collect()
        }
    }

    /// Root-mean-square of the left channel.
    pub(crate) fn rms(samples: &[Sample]) -> f32 {
        let sum: f32 = samples.iter().map(|s| s.left * s.left).sum();
        (sum / samples.len().max(1) as f32).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_is_constructible() {
        for &kind in KINDS {
            let machine = create_machine(kind).unwrap();
            assert_eq!(machine.info().kind, kind);
        }
        assert!(create_machine("Vocoder").is_none());
    }

    #[test]
    fn param_names_are_unique() {
        for &kind in KINDS {
            let machine = create_machine(kind).unwrap();
            let names: Vec<&str> = machine.params().iter().map(AnyParam::name).collect();
            for (i, name) in names.iter().enumerate() {
                assert!(!names[i + 1..].contains(name), "{kind}: duplicate {name}");
            }
        }
    }

    #[test]
    fn sinks_have_no_outputs() {
        let speaker = create_machine("Speaker").unwrap();
        assert!(speaker.info().outputs.is_empty());
        assert!(speaker.info().inputs.iter().all(|p| !p.midi));
    }
}
