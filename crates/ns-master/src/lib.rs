//! Headless controller for nodesynth.
//!
//! Owns the engine and the session settings and offers one API for
//! loading projects, offline rendering and realtime playback that the CLI
//! (or any other front end) can share.

mod config;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use ns_audio::{block_ring, event_inbox, InboxEvent, InboxReceiver};
use ns_engine::PortRef;
use ns_ir::{ComponentId, SampleKey};
use tracing::{info, warn};

// Re-export common types so callers don't need the lower crates directly.
pub use config::{ConfigError, SessionConfig};
pub use ns_audio::{AudioError, AudioOutput, BlockConsumer, CpalOutput, InboxSender};
pub use ns_engine::Engine;
pub use ns_formats::{FormatError, ProjectError};
pub use ns_ir::{AudioBlock, ControlEvent, NoteEvent, BLOCK_SIZE, SAMPLE_RATE};

#[cfg(feature = "alloc_check")]
pub use assert_no_alloc::AllocDisabler;

/// Counters from one realtime run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Blocks handed to the output
    pub blocks: u64,
    /// Times the output found no block ready
    pub underruns: u64,
    /// Live note events lost to a full pending pool
    pub dropped_events: u64,
}

/// Headless session controller. Owns an engine and feeds it live events.
pub struct Controller {
    engine: Engine,
    config: SessionConfig,
    inbox: InboxReceiver,
    sender: Option<InboxSender>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Controller {
    pub fn new(config: SessionConfig) -> Self {
        let mut engine = Engine::new();
        engine.set_tempo(config.tempo);
        engine.set_master_volume(config.master_volume);
        Self::with_engine(engine, config)
    }

    pub fn with_engine(engine: Engine, config: SessionConfig) -> Self {
        let (sender, inbox) = event_inbox(config.inbox_capacity);
        Self { engine, config, inbox, sender: Some(sender) }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The sending end of the live event inbox. Can be taken once.
    pub fn event_sender(&mut self) -> Option<InboxSender> {
        self.sender.take()
    }

    // --- Projects and assets ---

    /// Replace the engine with a project's contents. Never fails; an
    /// unreadable project yields an empty engine.
    pub fn load_project(&mut self, path: &Path) {
        self.engine = ns_formats::load_project(path);
        info!(
            path = %path.display(),
            components = self.engine.graph().len(),
            "project loaded"
        );
    }

    pub fn save_project(&self, path: &Path) -> Result<(), ProjectError> {
        ns_formats::save_project(&self.engine, path)
    }

    /// Read a WAV file into the sample bank. Failures give a silent asset.
    pub fn load_sample(&mut self, path: &Path) -> SampleKey {
        let asset = ns_formats::read_wav_file(path);
        self.engine.graph_mut().add_sample(asset)
    }

    /// Load a WAV file and hand it to a sample-playing component.
    pub fn attach_sample_file(&mut self, id: ComponentId, path: &Path) -> bool {
        let key = self.load_sample(path);
        let attached = self.engine.graph_mut().attach_sample(id, key);
        if !attached {
            warn!(id, "component does not take samples");
        }
        attached
    }

    // --- Rendering ---

    /// Deliver queued live events to the engine. Returns how many notes
    /// were dropped because the pending pool was full.
    pub fn drain_inbox(&mut self) -> u64 {
        let engine = &mut self.engine;
        let mut dropped = 0;
        self.inbox.drain(|event| match event {
            InboxEvent::Note(note) => {
                if !engine.push_event(note) {
                    dropped += 1;
                }
            }
            InboxEvent::Control(control) => engine.push_control(control),
        });
        dropped
    }

    fn render_one(&mut self) -> AudioBlock {
        #[cfg(feature = "alloc_check")]
        {
            let engine = &mut self.engine;
            assert_no_alloc::assert_no_alloc(|| *engine.render_block())
        }
        #[cfg(not(feature = "alloc_check"))]
        {
            *self.engine.render_block()
        }
    }

    /// Render whole blocks covering at least `seconds` of audio.
    pub fn render_seconds(&mut self, seconds: f32) -> Vec<AudioBlock> {
        let samples = (seconds.max(0.0) * SAMPLE_RATE as f32).ceil() as usize;
        let count = samples.div_ceil(BLOCK_SIZE);
        let mut blocks = Vec::with_capacity(count);
        for _ in 0..count {
            self.drain_inbox();
            blocks.push(self.render_one());
        }
        blocks
    }

    pub fn render_to_wav(&mut self, seconds: f32) -> Vec<u8> {
        let blocks = self.render_seconds(seconds);
        ns_formats::blocks_to_wav(&blocks)
    }

    // --- Real-time playback ---

    /// Drive `output` from the calling thread until `stop` is set or
    /// `max_blocks` blocks have been handed over.
    ///
    /// Each iteration drains the inbox, renders one block and pushes it
    /// into the block ring, sleeping while the ring is full.
    pub fn run_realtime<O: AudioOutput>(
        &mut self,
        output: &mut O,
        stop: &AtomicBool,
        max_blocks: Option<u64>,
    ) -> Result<RunStats, AudioError> {
        let (mut producer, consumer) = block_ring();
        let sleep = self.config.producer_sleep();
        output.start(consumer)?;
        info!(rate = output.sample_rate(), "playback started");

        let mut stats = RunStats::default();
        while !stop.load(Ordering::Acquire) && max_blocks.map_or(true, |max| stats.blocks < max) {
            stats.dropped_events += self.drain_inbox();
            let block = self.render_one();
            if !producer.push(&block, stop, sleep) {
                break;
            }
            stats.blocks += 1;
        }

        // Let the output play what is queued.
        while !producer.is_empty() && !stop.load(Ordering::Acquire) {
            thread::sleep(sleep);
        }

        output.stop()?;
        stats.underruns = producer.underruns();
        info!(
            blocks = stats.blocks,
            underruns = stats.underruns,
            dropped = stats.dropped_events,
            "playback stopped"
        );
        Ok(stats)
    }

    /// Play through the default audio device.
    pub fn play(&mut self, stop: &AtomicBool, max_blocks: Option<u64>) -> Result<RunStats, AudioError> {
        let mut output = CpalOutput::new()?;
        self.run_realtime(&mut output, stop, max_blocks)
    }
}

/// Build a small patch: a sequenced synth through filter, delay and
/// reverb into a speaker. Returns the ids in signal order.
pub fn demo_patch(engine: &mut Engine) -> Vec<ComponentId> {
    let graph = engine.graph_mut();
    let chain: Vec<ComponentId> = ["Sequencer", "Synth", "Filter", "Delay", "Reverb", "Speaker"]
        .iter()
        .filter_map(|kind| graph.add_component(kind))
        .collect();
    for pair in chain.windows(2) {
        graph.connect(PortRef::new(pair[0], 0), PortRef::new(pair[1], 0), 1.0);
    }
    if let [_, synth, filter, ..] = chain[..] {
        graph.set_param(synth, "waveform", 1.0);
        graph.set_param(synth, "release", 2.0);
        graph.set_param(filter, "cutoff", 1800.0);
        graph.set_param(filter, "resonance", 0.5);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;

    /// Output double that drains the ring on its own thread.
    #[derive(Default)]
    struct ThreadOutput {
        received: Arc<Mutex<Vec<AudioBlock>>>,
        running: Arc<AtomicBool>,
        handle: Option<JoinHandle<()>>,
    }

    impl AudioOutput for ThreadOutput {
        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }

        fn start(&mut self, mut consumer: BlockConsumer) -> Result<(), AudioError> {
            self.running.store(true, Ordering::Release);
            let running = self.running.clone();
            let received = self.received.clone();
            self.handle = Some(thread::spawn(move || {
                let mut block = AudioBlock::new();
                while running.load(Ordering::Acquire) {
                    if consumer.try_pop(&mut block) {
                        received.lock().unwrap().push(block);
                    } else {
                        thread::yield_now();
                    }
                }
            }));
            Ok(())
        }

        fn stop(&mut self) -> Result<(), AudioError> {
            self.running.store(false, Ordering::Release);
            if let Some(handle) = self.handle.take() {
                handle.join().map_err(|_| AudioError::Playback("consumer panicked".into()))?;
            }
            Ok(())
        }
    }

    #[test]
    fn config_sets_engine_defaults() {
        let config = SessionConfig { tempo: 100.0, master_volume: 0.3, ..Default::default() };
        let ctrl = Controller::new(config);
        assert_eq!(ctrl.engine().tempo(), 100.0);
        assert_eq!(ctrl.engine().master_volume(), 0.3);
    }

    #[test]
    fn render_seconds_rounds_up_to_blocks() {
        let mut ctrl = Controller::default();
        assert_eq!(ctrl.render_seconds(1.0).len(), 173);
        assert_eq!(ctrl.engine().clock(), 173 * BLOCK_SIZE as u64);
        assert!(ctrl.render_seconds(0.0).is_empty());
    }

    #[test]
    fn demo_patch_makes_sound() {
        let mut ctrl = Controller::default();
        let ids = demo_patch(ctrl.engine_mut());
        assert_eq!(ids.len(), 6);
        assert_eq!(ctrl.engine().graph().edges().count(), 5);
        let peak = ctrl.render_seconds(0.5).iter().map(AudioBlock::peak).fold(0.0, f32::max);
        assert!(peak > 0.0);
    }

    #[test]
    fn inbox_events_reach_the_engine() {
        let mut ctrl = Controller::default();
        let g = ctrl.engine_mut().graph_mut();
        let keys = g.add_component("Keyboard").unwrap();
        let synth = g.add_component("Synth").unwrap();
        let speaker = g.add_component("Speaker").unwrap();
        g.connect(PortRef::new(keys, 0), PortRef::new(synth, 0), 1.0);
        g.connect(PortRef::new(synth, 0), PortRef::new(speaker, 0), 1.0);

        let mut tx = ctrl.event_sender().unwrap();
        assert!(ctrl.event_sender().is_none());
        assert_eq!(ctrl.render_seconds(0.01)[0].peak(), 0.0);
        assert!(tx.send_note(NoteEvent::press(0, 69, 1.0)));
        assert!(ctrl.render_seconds(0.01)[0].peak() > 0.0);
    }

    #[test]
    fn full_pending_pool_counts_drops() {
        let config = SessionConfig { inbox_capacity: 100, ..Default::default() };
        let mut ctrl = Controller::new(config);
        let mut tx = ctrl.event_sender().unwrap();
        for i in 0..70 {
            assert!(tx.send_note(NoteEvent::press(0, i, 1.0)));
        }
        assert_eq!(ctrl.drain_inbox(), 70 - ns_ir::MAX_EVENTS as u64);
    }

    #[test]
    fn realtime_hands_blocks_in_order() {
        let mut ctrl = Controller::default();
        demo_patch(ctrl.engine_mut());
        let mut reference = Controller::default();
        demo_patch(reference.engine_mut());
        let expected = reference.engine_mut().render_blocks(20);

        let mut output = ThreadOutput::default();
        let stop = AtomicBool::new(false);
        let stats = ctrl.run_realtime(&mut output, &stop, Some(20)).unwrap();
        assert_eq!(stats.blocks, 20);
        assert_eq!(*output.received.lock().unwrap(), expected);
    }

    #[test]
    fn stop_flag_ends_run() {
        let mut ctrl = Controller::default();
        let mut output = ThreadOutput::default();
        let stop = AtomicBool::new(true);
        let stats = ctrl.run_realtime(&mut output, &stop, None).unwrap();
        assert_eq!(stats.blocks, 0);
    }

    #[test]
    fn missing_sample_file_is_silent() {
        let mut ctrl = Controller::default();
        let sampler = ctrl.engine_mut().graph_mut().add_component("Sampler").unwrap();
        assert!(ctrl.attach_sample_file(sampler, Path::new("/nonexistent/kick.wav")));
        let key = ctrl.engine().graph().samples().keys().next().unwrap();
        assert!(ctrl.engine().graph().sample(key).unwrap().is_empty());
    }

    #[test]
    fn project_round_trip_through_controller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        let mut ctrl = Controller::default();
        demo_patch(ctrl.engine_mut());
        ctrl.save_project(&path).unwrap();

        let mut other = Controller::default();
        other.load_project(&path);
        assert_eq!(other.engine().graph().len(), 6);
        assert_eq!(other.engine().graph().param(1, "release"), Some(2.0));
    }
}
