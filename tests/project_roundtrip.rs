//! Save/load of whole projects.

use ns_engine::{Engine, KINDS, PortRef};
use ns_formats::{project_to_json, read_project};

fn all_kinds() -> Engine {
    let mut engine = Engine::new();
    engine.set_tempo(133.0);
    let g = engine.graph_mut();
    for kind in KINDS {
        g.add_component(kind).unwrap();
    }
    // leave a hole in the id space
    let doomed = g.add_component("Speaker").unwrap();
    g.remove_component(doomed);
    let late = g.add_component("Filter").unwrap();

    let id = |kind: &str| KINDS.iter().position(|k| *k == kind).unwrap() as u32;
    assert!(g.connect(PortRef::new(id("Sequencer"), 0), PortRef::new(id("Synth"), 0), 0.9));
    assert!(g.connect(PortRef::new(id("Keyboard"), 0), PortRef::new(id("Sampler"), 0), 1.0));
    assert!(g.connect(PortRef::new(id("Synth"), 0), PortRef::new(late, 0), 0.5));
    assert!(g.connect(PortRef::new(id("Sampler"), 0), PortRef::new(late, 0), 0.25));
    assert!(g.connect(PortRef::new(late, 0), PortRef::new(id("Gate"), 0), 1.0));
    assert!(g.connect(PortRef::new(id("Sequencer"), 0), PortRef::new(id("Gate"), 1), 1.0));
    assert!(g.connect(PortRef::new(id("Gate"), 0), PortRef::new(id("Speaker"), 0), 1.0));
    g.set_param(late, "cutoff", 321.0);
    g.set_param(id("Sequencer"), "note_3", 72.0);
    g.set_param(id("Reverb"), "room", 0.9);
    g.set_name(late, "tone");
    engine
}

fn snapshot(engine: &Engine) -> Vec<(u32, String, String, Vec<(String, f64)>)> {
    let g = engine.graph();
    g.components()
        .map(|c| {
            let params = g
                .machine(c.id())
                .unwrap()
                .params()
                .iter()
                .map(|p| (p.name().to_string(), p.value()))
                .collect();
            (c.id(), c.kind().to_string(), c.name().to_string(), params)
        })
        .collect()
}

#[test]
fn save_then_load_is_identical() {
    let original = all_kinds();
    let loaded = read_project(&project_to_json(&original).unwrap()).unwrap();

    assert_eq!(loaded.tempo(), 133.0);
    assert_eq!(snapshot(&loaded), snapshot(&original));
    let a: Vec<_> = original.graph().edges().collect();
    let b: Vec<_> = loaded.graph().edges().collect();
    assert_eq!(a, b);
    assert_eq!(loaded.graph().next_id(), original.graph().next_id());
    assert_eq!(loaded.graph().update_order(), original.graph().update_order());
}

#[test]
fn second_save_is_byte_identical() {
    let first = project_to_json(&all_kinds()).unwrap();
    let second = project_to_json(&read_project(&first).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn loaded_project_renders_like_the_original() {
    let mut original = all_kinds();
    let mut loaded = read_project(&project_to_json(&original).unwrap()).unwrap();
    assert_eq!(original.render_blocks(50), loaded.render_blocks(50));
}
