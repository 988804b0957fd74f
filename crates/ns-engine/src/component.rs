//! Graph nodes and the per-block view a machine gets of them.

use ns_ir::{
    AudioBlock, ComponentId, EventList, NoteEvent, Sample, SampleAsset, SampleKey, SAMPLE_RATE,
};
use slotmap::SlotMap;

use crate::connector::{InputConnector, OutputConnector, PortRef};
use crate::machine::MachineInfo;

/// Graph-owned store of decoded sample assets.
pub type SampleBank = SlotMap<SampleKey, SampleAsset>;

/// A node in the processing graph: identity plus fixed-arity connectors.
///
/// The machine implementing its behaviour lives next to it in the graph.
#[derive(Clone, Debug)]
pub struct Component {
    id: ComponentId,
    name: String,
    kind: &'static str,
    pub(crate) inputs: Vec<InputConnector>,
    pub(crate) outputs: Vec<OutputConnector>,
}

impl Component {
    pub(crate) fn from_info(id: ComponentId, info: &MachineInfo) -> Self {
        Self {
            id,
            name: String::from(info.kind),
            kind: info.kind,
            inputs: info.inputs.iter().map(|p| InputConnector::new(p.name, p.midi)).collect(),
            outputs: info.outputs.iter().map(|p| OutputConnector::new(p.name, p.midi)).collect(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = String::from(name);
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn inputs(&self) -> &[InputConnector] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputConnector] {
        &self.outputs
    }

    /// No outputs and only audio inputs: the driver sums it into the block.
    pub fn is_sink(&self) -> bool {
        self.outputs.is_empty() && self.inputs.iter().all(|c| !c.is_midi())
    }

    /// Total number of edges leaving this component.
    pub fn out_degree(&self) -> usize {
        self.outputs.iter().map(|o| o.targets().len()).sum()
    }

    pub(crate) fn clear_outputs(&mut self) {
        for output in &mut self.outputs {
            output.clear();
        }
    }
}

/// Tempo and position for the block being processed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transport {
    /// Absolute index of the first sample of the block
    pub block_start: u64,
    /// Beats per minute
    pub tempo: f32,
}

impl Transport {
    pub fn new(block_start: u64, tempo: f32) -> Self {
        Self { block_start, tempo }
    }

    pub fn sample_rate(&self) -> f32 {
        SAMPLE_RATE as f32
    }

    /// Steps (sixteenth notes) per second: `4/60 * tempo`.
    pub fn steps_per_second(&self) -> f64 {
        4.0 / 60.0 * self.tempo as f64
    }

    pub fn steps_per_sample(&self) -> f64 {
        self.steps_per_second() / SAMPLE_RATE as f64
    }

    /// Length of `steps` in samples.
    pub fn steps_to_samples(&self, steps: f64) -> f64 {
        if self.tempo <= 0.0 {
            return 0.0;
        }
        steps / self.steps_per_sample()
    }
}

/// Look up the output connector an edge originates from.
pub(crate) fn source_output(arena: &[Option<Component>], port: PortRef) -> Option<&OutputConnector> {
    arena
        .get(port.component as usize)
        .and_then(Option::as_ref)
        .and_then(|c| c.outputs.get(port.index))
}

/// Weighted sum of every output feeding `input` at sample `i`.
///
/// Weights are squared so the control feels closer to linear in loudness.
pub(crate) fn mix_input(arena: &[Option<Component>], input: &InputConnector, i: usize) -> Sample {
    let mut sum = Sample::ZERO;
    for link in input.links() {
        if let Some(block) = source_output(arena, link.source).and_then(|o| o.audio()) {
            sum += block[i] * (link.weight * link.weight);
        }
    }
    sum
}

/// Add the weighted block of every output feeding `input` into `out`.
pub(crate) fn accumulate_input(
    arena: &[Option<Component>],
    input: &InputConnector,
    out: &mut AudioBlock,
) {
    for link in input.links() {
        if let Some(block) = source_output(arena, link.source).and_then(|o| o.audio()) {
            out.mix_from_scaled(block, link.weight * link.weight);
        }
    }
}

/// What a machine sees during `update`: its inputs resolved against the
/// arena, its own outputs, and block-wide state.
pub struct UpdateContext<'a> {
    pub transport: Transport,
    /// Note events pushed into the engine for this block
    pub pending: &'a [NoteEvent],
    pub samples: &'a SampleBank,
    inputs: &'a [InputConnector],
    arena: &'a [Option<Component>],
    outputs: &'a mut [OutputConnector],
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(
        transport: Transport,
        pending: &'a [NoteEvent],
        samples: &'a SampleBank,
        inputs: &'a [InputConnector],
        arena: &'a [Option<Component>],
        outputs: &'a mut [OutputConnector],
    ) -> Self {
        Self { transport, pending, samples, inputs, arena, outputs }
    }

    pub fn is_connected(&self, input: usize) -> bool {
        self.inputs.get(input).is_some_and(InputConnector::is_connected)
    }

    /// Mixed audio of input `input` at sample `i`.
    pub fn audio(&self, input: usize, i: usize) -> Sample {
        match self.inputs.get(input) {
            Some(connector) if !connector.is_midi() => mix_input(self.arena, connector, i),
            _ => Sample::ZERO,
        }
    }

    /// Mixed audio of input `input` for the whole block.
    pub fn read_audio(&self, input: usize, out: &mut AudioBlock) {
        out.silence();
        if let Some(connector) = self.inputs.get(input).filter(|c| !c.is_midi()) {
            accumulate_input(self.arena, connector, out);
        }
    }

    /// Events of every source feeding input `input`, concatenated in link
    /// order with velocities scaled by the edge weight.
    pub fn read_events(&self, input: usize, out: &mut EventList) {
        out.clear();
        let Some(connector) = self.inputs.get(input).filter(|c| c.is_midi()) else {
            return;
        };
        for link in connector.links() {
            let Some(events) = source_output(self.arena, link.source).and_then(|o| o.events()) else {
                continue;
            };
            for event in events {
                if out.push(event.scaled(link.weight)).is_err() {
                    return;
                }
            }
        }
    }

    /// Writable audio block of output `output`.
    pub fn audio_out(&mut self, output: usize) -> Option<&mut AudioBlock> {
        self.outputs.get_mut(output).and_then(OutputConnector::audio_mut)
    }

    pub fn write_audio(&mut self, output: usize, i: usize, value: Sample) {
        if let Some(block) = self.audio_out(output) {
            block[i] = value;
        }
    }

    /// Emit an event on a MIDI output. False if the output is full or not MIDI.
    pub fn emit(&mut self, output: usize, event: NoteEvent) -> bool {
        self.outputs.get_mut(output).is_some_and(|o| o.push_event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_tempo() {
        let t = Transport::new(0, 120.0);
        assert!((t.steps_per_second() - 8.0).abs() < 1e-9);
        // one step at 120 BPM is 1/8 s
        assert!((t.steps_to_samples(1.0) - SAMPLE_RATE as f64 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn zero_tempo_has_no_step_length() {
        let t = Transport::new(0, 0.0);
        assert_eq!(t.steps_to_samples(4.0), 0.0);
    }
}
