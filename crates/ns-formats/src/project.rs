//! Project documents.
//!
//! A project is a JSON array of single-key entries:
//!
//! ```json
//! [
//!   {"Settings": {"tempo": 120.0, "master_volume": 0.8}},
//!   {"Synth": {"id": 0, "name": "lead", "volume": 0.5, ...}},
//!   {"Connection": {"component_out": 0, "component_in": 1,
//!                   "offset_out": 0, "offset_in": 0, "weight": 1.0}}
//! ]
//! ```
//!
//! A component playing a sample file also carries `"sample": "<path>"`;
//! relative paths resolve against the project file's directory.
//!
//! Loading never fails outright: whatever cannot be understood is skipped
//! or defaulted and reported with `warn!`.

use std::fs;
use std::path::Path;

use ns_engine::{Engine, PortRef};
use ns_ir::{AnyParam, ComponentId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::wav_format::read_wav_file;
use crate::ProjectError;

const SETTINGS: &str = "Settings";
const CONNECTION: &str = "Connection";
const SAMPLE: &str = "sample";

#[derive(Debug, Serialize, Deserialize)]
struct Settings {
    tempo: Option<f32>,
    master_volume: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Connection {
    component_out: ComponentId,
    component_in: ComponentId,
    offset_out: usize,
    offset_in: usize,
    #[serde(default = "unit_weight")]
    weight: f32,
}

fn unit_weight() -> f32 {
    1.0
}

// --- Saving ---

/// Serialize the engine's settings, components and edges.
pub fn project_to_json(engine: &Engine) -> Result<String, ProjectError> {
    let mut entries = Vec::new();
    let settings = Settings {
        tempo: Some(engine.tempo()),
        master_volume: Some(engine.master_volume()),
    };
    entries.push(json!({ SETTINGS: settings }));

    let graph = engine.graph();
    for component in graph.components() {
        let Some(machine) = graph.machine(component.id()) else {
            continue;
        };
        let mut body = Map::new();
        body.insert("id".into(), json!(component.id()));
        body.insert("name".into(), json!(component.name()));
        for param in machine.params() {
            let value = match param {
                AnyParam::Float(p) => json!(p.get()),
                AnyParam::Int(p) => json!(p.get()),
            };
            body.insert(param.name().into(), value);
        }
        let source = graph.attached_sample(component.id()).and_then(|a| a.source.as_deref());
        if let Some(source) = source {
            body.insert(SAMPLE.into(), json!(source));
        }
        entries.push(json!({ component.kind(): body }));
    }

    for edge in graph.edges() {
        let connection = Connection {
            component_out: edge.from.component,
            component_in: edge.to.component,
            offset_out: edge.from.index,
            offset_in: edge.to.index,
            weight: edge.weight,
        };
        entries.push(json!({ CONNECTION: connection }));
    }

    Ok(serde_json::to_string_pretty(&entries)?)
}

pub fn save_project(engine: &Engine, path: &Path) -> Result<(), ProjectError> {
    let text = project_to_json(engine)?;
    fs::write(path, text)?;
    debug!(path = %path.display(), "project saved");
    Ok(())
}

// --- Loading ---

/// Read a project file, falling back to an empty engine on any error.
pub fn load_project(path: &Path) -> Engine {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read project, starting empty");
            return Engine::new();
        }
    };
    let base = path.parent().unwrap_or(Path::new(""));
    match read_project_in(&text, base) {
        Ok(engine) => engine,
        Err(err) => {
            warn!(path = %path.display(), %err, "malformed project, starting empty");
            Engine::new()
        }
    }
}

/// Build an engine from a project document.
///
/// Only a document that is not a JSON array is an error. Bad entries are
/// skipped, missing parameters keep their defaults.
pub fn read_project(text: &str) -> Result<Engine, ProjectError> {
    read_project_in(text, Path::new(""))
}

fn read_project_in(text: &str, base: &Path) -> Result<Engine, ProjectError> {
    let Value::Array(entries) = serde_json::from_str::<Value>(text)? else {
        return Err(ProjectError::NotAnArray);
    };

    let mut engine = Engine::new();
    let mut connections = Vec::new();

    for entry in entries {
        let Some((key, body)) = single_entry(entry) else {
            warn!("skipping project entry that is not a single-key object");
            continue;
        };
        match key.as_str() {
            SETTINGS => apply_settings(&mut engine, body),
            CONNECTION => match serde_json::from_value::<Connection>(body) {
                Ok(connection) => connections.push(connection),
                Err(err) => warn!(%err, "skipping malformed connection"),
            },
            kind => load_component(&mut engine, kind, body, base),
        }
    }

    // Components first so connections may appear anywhere in the document.
    for c in connections {
        let from = PortRef::new(c.component_out, c.offset_out);
        let to = PortRef::new(c.component_in, c.offset_in);
        if !engine.graph_mut().connect(from, to, c.weight) {
            warn!(?from, ?to, "skipping invalid connection");
        }
    }
    Ok(engine)
}

fn single_entry(entry: Value) -> Option<(String, Value)> {
    let Value::Object(map) = entry else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    map.into_iter().next()
}

fn apply_settings(engine: &mut Engine, body: Value) {
    let settings = match serde_json::from_value::<Settings>(body) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(%err, "malformed settings, using defaults");
            return;
        }
    };
    match settings.tempo {
        Some(tempo) => engine.set_tempo(tempo),
        None => warn!("settings missing tempo, using default"),
    }
    match settings.master_volume {
        Some(volume) => engine.set_master_volume(volume),
        None => warn!("settings missing master_volume, using default"),
    }
}

fn load_component(engine: &mut Engine, kind: &str, body: Value, base: &Path) {
    let Value::Object(fields) = body else {
        warn!(kind, "skipping component entry without fields");
        return;
    };
    let Some(id) = fields
        .get("id")
        .and_then(Value::as_u64)
        .and_then(|id| ComponentId::try_from(id).ok())
    else {
        warn!(kind, "skipping component without a valid id");
        return;
    };

    let graph = engine.graph_mut();
    if !graph.insert_component(kind, id) {
        warn!(kind, id, "skipping unknown kind, duplicate or out-of-range id");
        return;
    }
    if let Some(name) = fields.get("name").and_then(Value::as_str) {
        graph.set_name(id, name);
    }

    if let Some(machine) = graph.machine_mut(id) {
        for param in machine.params_mut() {
            match fields.get(param.name()).and_then(Value::as_f64) {
                Some(value) => param.set_value(value),
                None => warn!(kind, id, param = param.name(), "missing parameter, using default"),
            }
        }
    }

    if let Some(source) = fields.get(SAMPLE).and_then(Value::as_str) {
        let asset = read_wav_file(&base.join(source)).with_source(source);
        let key = graph.add_sample(asset);
        if !graph.attach_sample(id, key) {
            warn!(kind, id, "component does not take samples, ignoring sample");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_ir::{AudioBlock, Sample, BLOCK_SIZE};

    fn patch() -> Engine {
        let mut engine = Engine::new();
        engine.set_tempo(96.0);
        engine.set_master_volume(0.5);
        let g = engine.graph_mut();
        let keys = g.add_component("Keyboard").unwrap();
        let synth = g.add_component("Synth").unwrap();
        let filter = g.add_component("Filter").unwrap();
        let speaker = g.add_component("Speaker").unwrap();
        g.set_name(synth, "lead");
        g.set_param(synth, "waveform", 2.0);
        g.set_param(filter, "cutoff", 440.0);
        assert!(g.connect(PortRef::new(keys, 0), PortRef::new(synth, 0), 1.0));
        assert!(g.connect(PortRef::new(synth, 0), PortRef::new(filter, 0), 0.75));
        assert!(g.connect(PortRef::new(filter, 0), PortRef::new(speaker, 0), 1.0));
        engine
    }

    #[test]
    fn document_shape() {
        let text = project_to_json(&patch()).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        let entries = doc.as_array().unwrap();
        assert_eq!(entries.len(), 1 + 4 + 3);
        assert_eq!(entries[0]["Settings"]["tempo"], json!(96.0));
        assert_eq!(entries[2]["Synth"]["name"], json!("lead"));
        assert_eq!(entries[2]["Synth"]["waveform"], json!(2));
        assert_eq!(entries[6]["Connection"]["weight"], json!(0.75));
    }

    #[test]
    fn reload_matches() {
        let original = patch();
        let loaded = read_project(&project_to_json(&original).unwrap()).unwrap();
        assert_eq!(loaded.tempo(), 96.0);
        assert_eq!(loaded.master_volume(), 0.5);
        assert_eq!(loaded.graph().len(), 4);
        assert_eq!(loaded.graph().component(1).unwrap().name(), "lead");
        assert_eq!(loaded.graph().param(2, "cutoff"), Some(440.0));
        let a: Vec<_> = original.graph().edges().collect();
        let b: Vec<_> = loaded.graph().edges().collect();
        assert_eq!(a, b);
        assert_eq!(loaded.graph().next_id(), 4);
    }

    #[test]
    fn missing_params_use_defaults() {
        let text = r#"[{"Synth": {"id": 3, "volume": 0.25}}]"#;
        let engine = read_project(text).unwrap();
        assert_eq!(engine.tempo(), 120.0);
        assert_eq!(engine.graph().param(3, "volume"), Some(0.25));
        assert_eq!(engine.graph().param(3, "sustain"), Some(0.7f32 as f64));
        assert_eq!(engine.graph().next_id(), 4);
    }

    #[test]
    fn bad_entries_are_skipped() {
        let text = r#"[
            {"Speaker": {"id": 0}},
            {"Theremin": {"id": 1}},
            {"Speaker": {"name": "no id"}},
            {"Speaker": {"id": 0}},
            42,
            {"Connection": {"component_out": 0, "component_in": 9, "offset_out": 0, "offset_in": 0}},
            {"Connection": {"component_out": "zero"}}
        ]"#;
        let engine = read_project(text).unwrap();
        assert_eq!(engine.graph().len(), 1);
        assert_eq!(engine.graph().edges().count(), 0);
    }

    #[test]
    fn huge_ids_are_skipped() {
        let text = r#"[
            {"Speaker": {"id": 4294967295}},
            {"Speaker": {"id": 65536}},
            {"Speaker": {"id": 2}}
        ]"#;
        let engine = read_project(text).unwrap();
        assert_eq!(engine.graph().len(), 1);
        assert_eq!(engine.graph().next_id(), 3);
    }

    #[test]
    fn sampler_keeps_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut block = AudioBlock::new();
        block[3] = Sample::new(0.5, -0.5);
        fs::write(dir.path().join("kick.wav"), crate::blocks_to_wav(&[block])).unwrap();

        let mut engine = Engine::new();
        let g = engine.graph_mut();
        let sampler = g.add_component("Sampler").unwrap();
        let asset = read_wav_file(&dir.path().join("kick.wav")).with_source("kick.wav");
        let key = g.add_sample(asset);
        assert!(g.attach_sample(sampler, key));

        let path = dir.path().join("patch.json");
        save_project(&engine, &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains(r#""sample": "kick.wav""#));

        let loaded = load_project(&path);
        let asset = loaded.graph().attached_sample(sampler).unwrap();
        assert_eq!(asset.len(), BLOCK_SIZE);
        assert!((asset.frames[3].left - 0.5).abs() < 1e-3);
        assert_eq!(asset.source.as_deref(), Some("kick.wav"));
    }

    #[test]
    fn missing_sample_file_is_kept_as_a_reference() {
        let text = r#"[{"Sampler": {"id": 0, "sample": "/nonexistent/hat.wav"}}]"#;
        let engine = read_project(text).unwrap();
        let asset = engine.graph().attached_sample(0).unwrap();
        assert!(asset.is_empty());
        let saved = project_to_json(&engine).unwrap();
        assert!(saved.contains("/nonexistent/hat.wav"));
    }

    #[test]
    fn not_an_array_is_an_error() {
        assert!(matches!(read_project("{}"), Err(ProjectError::NotAnArray)));
        assert!(matches!(read_project("[oops"), Err(ProjectError::Json(_))));
    }

    #[test]
    fn unreadable_file_gives_empty_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();
        assert!(load_project(&path).graph().is_empty());
        assert!(load_project(&dir.path().join("missing.json")).graph().is_empty());
    }

    #[test]
    fn save_then_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch.json");
        save_project(&patch(), &path).unwrap();
        let engine = load_project(&path);
        assert_eq!(engine.graph().len(), 4);
        assert_eq!(engine.graph().edges().count(), 3);
    }
}
