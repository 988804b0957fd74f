//! Allocation-free render path tests.
//!
//! These tests verify that `Engine::render_block()` does not allocate once
//! a graph is built. Every machine kind is exercised with notes, releases
//! and voice stealing for several seconds.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use ns_engine::{Engine, PortRef};
use ns_ir::{ControlEvent, NoteEvent, ParamAddress, Sample, SampleAsset};

const SECOND: usize = 44100 / ns_ir::BLOCK_SIZE + 1;

fn connect(engine: &mut Engine, from: u32, to: u32) {
    assert!(engine.graph_mut().connect(PortRef::new(from, 0), PortRef::new(to, 0), 1.0));
}

/// Render `blocks` blocks, aborting on any heap allocation.
fn assert_render_alloc_free(engine: &mut Engine, blocks: usize, mut before: impl FnMut(&mut Engine, usize)) {
    for i in 0..blocks {
        before(engine, i);
        assert_no_alloc(|| {
            engine.render_block();
        });
    }
}

#[test]
fn synth_chain_alloc_free() {
    let mut engine = Engine::new();
    let g = engine.graph_mut();
    let ids: Vec<u32> = ["Keyboard", "Synth", "Filter", "Equalizer", "Delay", "Reverb", "Spectrum", "Speaker"]
        .iter()
        .map(|k| g.add_component(k).unwrap())
        .collect();
    for pair in ids.windows(2) {
        connect(&mut engine, pair[0], pair[1]);
    }
    engine.graph_mut().controls_mut().link(1, ParamAddress::new(ids[2], 1));

    assert_render_alloc_free(&mut engine, 5 * SECOND, |engine, i| {
        // more presses than voices, so stealing kicks in
        let note = 36 + (i % 48) as u8;
        engine.push_event(NoteEvent::press((i % 200) as u32, note, 0.8));
        if i % 3 == 0 {
            engine.push_event(NoteEvent::release(0, note.saturating_sub(6)));
        }
        engine.push_control(ControlEvent::new(1, (i % 100) as f32 / 100.0));
    });
}

#[test]
fn sequencer_sampler_gate_alloc_free() {
    let mut engine = Engine::new();
    let frames = (0..2000).map(|i| Sample::mono((i as f32 * 0.05).sin())).collect();
    let key = engine.graph_mut().add_sample(SampleAsset::new("tone", frames));

    let g = engine.graph_mut();
    let seq = g.add_component("Sequencer").unwrap();
    let sampler = g.add_component("Sampler").unwrap();
    let gate = g.add_component("Gate").unwrap();
    let speaker = g.add_component("Speaker").unwrap();
    assert!(g.attach_sample(sampler, key));
    connect(&mut engine, seq, sampler);
    connect(&mut engine, sampler, gate);
    connect(&mut engine, gate, speaker);
    assert!(engine.graph_mut().connect(PortRef::new(seq, 0), PortRef::new(gate, 1), 1.0));
    engine.set_tempo(300.0);

    assert_render_alloc_free(&mut engine, 5 * SECOND, |_, _| {});
}
