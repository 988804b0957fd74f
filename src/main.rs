//! nodesynth CLI: headless playback and WAV export of a project.
//!
//! Usage:
//!   nodesynth patch.json
//!   nodesynth --demo --wav out.wav --seconds 8
//!   nodesynth patch.json --sample 3=kick.wav --config session.toml

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use ns_master::{demo_patch, Controller, SessionConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(all(feature = "alloc_check", debug_assertions))]
#[global_allocator]
static A: ns_master::AllocDisabler = ns_master::AllocDisabler;

#[derive(Parser)]
#[command(name = "nodesynth")]
#[command(version, about = "Graph-based audio synthesis engine", long_about = None)]
struct Cli {
    /// Project file (JSON)
    project: Option<PathBuf>,

    /// Session config (TOML); defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Build the demo patch instead of loading a project
    #[arg(long, conflicts_with = "project")]
    demo: bool,

    /// Render offline to this WAV file instead of playing
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Length to render or play
    #[arg(long, default_value_t = 10.0)]
    seconds: f32,

    /// Attach a WAV file to a component, as ID=PATH
    #[arg(long, value_parser = parse_sample)]
    sample: Vec<(u32, PathBuf)>,

    /// Save the (possibly demo) project here before running
    #[arg(long)]
    save: Option<PathBuf>,
}

fn parse_sample(arg: &str) -> Result<(u32, PathBuf), String> {
    let (id, path) = arg.split_once('=').ok_or("expected ID=PATH")?;
    let id = id.parse().map_err(|e| format!("bad component id: {e}"))?;
    Ok((id, PathBuf::from(path)))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .init();

    let mut ctrl = Controller::new(config);
    match (&cli.project, cli.demo) {
        (Some(path), _) => ctrl.load_project(path),
        (None, true) => {
            demo_patch(ctrl.engine_mut());
        }
        (None, false) => bail!("give a project file or --demo"),
    }

    for (id, path) in &cli.sample {
        ctrl.attach_sample_file(*id, path);
    }

    if let Some(path) = &cli.save {
        ctrl.save_project(path)
            .with_context(|| format!("saving project {}", path.display()))?;
        info!(path = %path.display(), "project saved");
    }

    match &cli.wav {
        Some(path) => render_to_wav(&mut ctrl, path, cli.seconds),
        None => play_audio(&mut ctrl, cli.seconds),
    }
}

fn render_to_wav(ctrl: &mut Controller, path: &Path, seconds: f32) -> anyhow::Result<()> {
    info!(path = %path.display(), seconds, "rendering");
    let wav = ctrl.render_to_wav(seconds);
    std::fs::write(path, &wav).with_context(|| format!("writing {}", path.display()))?;
    info!(bytes = wav.len(), "done");
    Ok(())
}

fn play_audio(ctrl: &mut Controller, seconds: f32) -> anyhow::Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let s = Arc::clone(&stop);
    ctrlc::set_handler(move || s.store(true, Ordering::Release))?;

    let blocks = (seconds.max(0.0) * ns_master::SAMPLE_RATE as f32 / ns_master::BLOCK_SIZE as f32)
        .ceil() as u64;
    let stats = ctrl.play(&stop, Some(blocks))?;
    if stats.underruns > 0 {
        info!(underruns = stats.underruns, "output ran dry");
    }
    Ok(())
}
