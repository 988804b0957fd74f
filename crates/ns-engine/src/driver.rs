//! Block execution driver.

use ns_ir::{AudioBlock, ControlEvent, EventList, NoteEvent, Parameter, BLOCK_SIZE};

use crate::component::Transport;
use crate::graph::Graph;

/// Slowest tempo the engine accepts, in BPM.
pub const MIN_TEMPO: f32 = 20.0;
/// Fastest tempo the engine accepts, in BPM.
pub const MAX_TEMPO: f32 = 300.0;

/// Owns the graph and renders it one block at a time.
pub struct Engine {
    graph: Graph,
    tempo: Parameter<f32>,
    master_volume: Parameter<f32>,
    /// Note events for the next block, offsets relative to its start
    pending: EventList,
    /// Absolute index of the next block's first sample
    clock: u64,
    output: AudioBlock,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_graph(Graph::new())
    }

    pub fn with_graph(graph: Graph) -> Self {
        Self {
            graph,
            tempo: Parameter::new("tempo", MIN_TEMPO, MAX_TEMPO, 120.0),
            master_volume: Parameter::new("master_volume", 0.0, 1.0, 0.8),
            pending: EventList::new(),
            clock: 0,
            output: AudioBlock::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Beats per minute.
    pub fn tempo(&self) -> f32 {
        self.tempo.get()
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.tempo.set(bpm);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume.get()
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume.set(volume);
    }

    pub fn tempo_param(&self) -> &Parameter<f32> {
        &self.tempo
    }

    pub fn master_volume_param(&self) -> &Parameter<f32> {
        &self.master_volume
    }

    /// Absolute index of the next sample to be rendered.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn transport(&self) -> Transport {
        Transport::new(self.clock, self.tempo.get())
    }

    /// Queue a note event for the next block.
    ///
    /// Fails when the offset lies outside the block or the pool is full.
    pub fn push_event(&mut self, event: NoteEvent) -> bool {
        (event.time as usize) < BLOCK_SIZE && self.pending.push(event).is_ok()
    }

    pub fn pending(&self) -> &[NoteEvent] {
        &self.pending
    }

    /// Route a controller value to the parameters linked to it.
    pub fn push_control(&mut self, event: ControlEvent) {
        self.graph.apply_control(event);
    }

    /// Render one block.
    ///
    /// Clears every output, runs each component once in schedule order,
    /// sums the sinks, applies master volume and drops the pending events.
    /// Does not allocate.
    pub fn render_block(&mut self) -> &AudioBlock {
        let transport = self.transport();
        self.graph.clear_outputs();
        self.graph.update_all(transport, &self.pending);

        self.output.silence();
        self.graph.mix_sinks(&mut self.output);
        self.output.apply_gain(self.master_volume.get());

        self.pending.clear();
        self.clock += BLOCK_SIZE as u64;
        &self.output
    }

    /// Render `count` consecutive blocks.
    pub fn render_blocks(&mut self, count: usize) -> Vec<AudioBlock> {
        (0..count).map(|_| *self.render_block()).collect()
    }

    /// Rewind the clock and drop all playback state.
    pub fn reset(&mut self) {
        self.graph.reset();
        self.pending.clear();
        self.clock = 0;
        self.output.silence();
    }
}
