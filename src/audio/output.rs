use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig, SupportedStreamConfig};

use crate::engine::Engine;

/// Default output device, opened but not yet running.
///
/// The engine has to be built at the device's sample rate, so the device is
/// queried first and the stream started once the engine exists.
pub struct AudioDevice {
    device: Device,
    config: SupportedStreamConfig,
}

impl AudioDevice {
    pub fn default_output() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No output device available")?;
        let config = device
            .default_output_config()
            .context("Failed to query default output config")?;

        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate().0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels()
    }

    pub fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown".to_string())
    }

    /// Move the engine into the device callback and start the stream
    pub fn start(self, engine: Engine, block_size: usize) -> Result<AudioOutput> {
        let format = self.config.sample_format();
        let config: StreamConfig = self.config.into();

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&self.device, &config, engine, block_size)?,
            SampleFormat::I16 => build_stream::<i16>(&self.device, &config, engine, block_size)?,
            SampleFormat::U16 => build_stream::<u16>(&self.device, &config, engine, block_size)?,
            format => anyhow::bail!("Unsupported sample format: {:?}", format),
        };

        stream.play().context("Failed to start output stream")?;
        log::info!(
            "Audio output running: {} Hz, {} channels, {:?}",
            config.sample_rate.0,
            config.channels,
            format
        );

        Ok(AudioOutput {
            _stream: stream,
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        })
    }
}

/// A running output stream. Audio stops when this is dropped.
pub struct AudioOutput {
    _stream: Stream,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Build the audio stream for a specific sample format. The callback renders
/// in engine-sized blocks so commands land on block boundaries whatever
/// buffer size the device picks.
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut engine: Engine,
    block_size: usize,
) -> Result<Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let chunk = block_size.max(1) * channels.max(1);
    let mut scratch = vec![0.0f32; chunk];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for out in data.chunks_mut(chunk) {
                let buf = &mut scratch[..out.len()];
                engine.process_interleaved(buf, channels);
                for (sample, &value) in out.iter_mut().zip(buf.iter()) {
                    *sample = T::from_sample(value);
                }
            }
        },
        |err| {
            log::error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}
