use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use groovebox::audio::AudioDevice;
use groovebox::demo::load_demo;
use groovebox::event::EventSource;
use groovebox::render::render_wav;
use groovebox::synth::preset_names;
use groovebox::{build, Controller, EngineConfig, SilentDrums};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const STATUS_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_RENDER_SECONDS: f32 = 8.0;

/// Groovebox - transport, recording sequencer and polysynth
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tempo override
    #[arg(long)]
    bpm: Option<u16>,

    /// Pattern length in bars
    #[arg(long)]
    bars: Option<u8>,

    /// Factory preset index
    #[arg(long)]
    preset: Option<usize>,

    /// How long to run (live) or render; live mode runs until killed if unset
    #[arg(long)]
    seconds: Option<f32>,

    /// Render the demo to this WAV file instead of playing it
    #[arg(long)]
    render: Option<PathBuf>,

    /// List factory presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Print status snapshots as JSON on stdout
    #[arg(long)]
    status_json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_presets {
        println!("Factory presets:");
        for (index, name) in preset_names().iter().enumerate() {
            println!("  {}: {}", index, name);
        }
        return Ok(());
    }

    let mut config = EngineConfig::load_or_default(args.config.as_deref())?;
    if let Some(bpm) = args.bpm {
        config.bpm = bpm;
    }
    if let Some(bars) = args.bars {
        config.pattern_bars = bars;
    }
    if let Some(preset) = args.preset {
        config.preset = preset;
    }

    match &args.render {
        Some(path) => run_render(&config, &args, path),
        None => run_live(config, &args),
    }
}

fn run_render(config: &EngineConfig, args: &Args, path: &Path) -> Result<()> {
    let (mut engine, mut controller) = build(config, Box::new(SilentDrums));
    load_demo(&mut engine);
    controller.play();

    let seconds = args.seconds.unwrap_or(DEFAULT_RENDER_SECONDS);
    let result = render_wav(&mut engine, seconds, config.block_size, path)?;
    println!(
        "Rendered {:.2}s ({} frames) to {}",
        result.duration_secs,
        result.frames,
        path.display()
    );

    let report = controller.poll();
    log::debug!("{} playback events during render", report.events);
    if args.status_json {
        print_json(&controller)?;
    }
    Ok(())
}

fn run_live(mut config: EngineConfig, args: &Args) -> Result<()> {
    let device = AudioDevice::default_output()?;
    log::info!("Using output device {}", device.name());
    config.sample_rate = device.sample_rate();

    let (mut engine, mut controller) = build(&config, Box::new(SilentDrums));
    load_demo(&mut engine);

    let _output = device.start(engine, config.block_size)?;
    controller.play();

    let started = Instant::now();
    let mut last_status = Instant::now();
    let mut dropped_total = 0u64;
    let mut last_event_id = 0u64;

    loop {
        thread::sleep(POLL_INTERVAL);

        let report = controller.poll();
        if report.state_changed || report.bank_changed {
            let snap = controller.snapshot();
            log::info!(
                "{} {} BPM, bank {}",
                snap.transport.name(),
                snap.bpm,
                snap.bank_name
            );
        }
        if report.nan_detected {
            log::warn!("Synth produced a non-finite sample; voice reset");
        }
        if report.stuck_voice {
            log::warn!("Released voice failed to decay; voice killed");
        }
        if report.newly_dropped > 0 {
            dropped_total += report.newly_dropped;
            log::warn!(
                "Playback queue full: {} events dropped ({} total)",
                report.newly_dropped,
                dropped_total
            );
        }

        if report.newly_dropped_commands > 0 {
            log::warn!(
                "Command bus full: {} commands dropped",
                report.newly_dropped_commands
            );
        }

        if last_status.elapsed() >= STATUS_INTERVAL {
            last_status = Instant::now();
            if args.status_json {
                print_json(&controller)?;
            } else {
                log_status(&controller);
            }
            last_event_id = log_recent_events(&controller, last_event_id);
        }

        if let Some(limit) = args.seconds {
            if started.elapsed().as_secs_f32() >= limit {
                break;
            }
        }
    }

    controller.stop();
    // Let the stop reach the callback before the stream is dropped
    thread::sleep(POLL_INTERVAL);
    Ok(())
}

fn log_status(controller: &Controller) {
    let snap = controller.snapshot();
    log::info!(
        "{} {} | {} BPM | voices {}/{} | preset {} | bank {} | events {} | auto {}",
        snap.transport.name(),
        snap.position,
        snap.bpm,
        snap.synth_voices,
        snap.drum_voices,
        snap.preset_name,
        snap.bank_name,
        snap.track_events.iter().map(|&n| n as u32).sum::<u32>(),
        snap.automation_points.iter().map(|&n| n as u32).sum::<u32>(),
    );
}

/// Summarise the monitor entries since `since_id`; returns the newest id seen
fn log_recent_events(controller: &Controller, since_id: u64) -> u64 {
    let events = controller.events_since(since_id);
    let Some(last) = events.last() else {
        return since_id;
    };
    let played = events
        .iter()
        .filter(|e| e.source == EventSource::Playback)
        .count();
    log::info!(
        "{} events ({} from playback), last: {}",
        events.len(),
        played,
        last.describe()
    );
    last.id
}

fn print_json(controller: &Controller) -> Result<()> {
    let json = serde_json::to_string(&controller.snapshot()).context("Failed to serialize status")?;
    println!("{}", json);
    Ok(())
}
