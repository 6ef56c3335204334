use std::path::Path;

use anyhow::{Context, Result};

use crate::engine::{Engine, StereoFrame};

/// Result of an offline render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderResult {
    pub duration_secs: f32,
    pub frames: usize,
    pub peak: f32,
}

/// Run the engine for `seconds` of audio, one block at a time, exactly as
/// the device callback would.
pub fn render(engine: &mut Engine, seconds: f32, block_size: usize) -> Vec<StereoFrame> {
    let total = (engine.sample_rate() * seconds.max(0.0)) as usize;
    let block_size = block_size.max(1);

    let mut output = vec![StereoFrame::default(); total];
    for block in output.chunks_mut(block_size) {
        engine.process_block(block);
    }
    output
}

/// Render and write a 16-bit stereo WAV file
pub fn render_wav(
    engine: &mut Engine,
    seconds: f32,
    block_size: usize,
    path: &Path,
) -> Result<RenderResult> {
    let frames = render(engine, seconds, block_size);
    let sample_rate = engine.sample_rate();

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: sample_rate as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    let mut peak = 0.0f32;
    for frame in &frames {
        peak = peak.max(frame.left.abs()).max(frame.right.abs());
        writer.write_sample(to_i16(frame.left))?;
        writer.write_sample(to_i16(frame.right))?;
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;

    log::info!(
        "Rendered {} frames ({:.2}s, peak {:.3}) to {}",
        frames.len(),
        frames.len() as f32 / sample_rate,
        peak,
        path.display()
    );

    Ok(RenderResult {
        duration_secs: frames.len() as f32 / sample_rate,
        frames: frames.len(),
        peak,
    })
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}
