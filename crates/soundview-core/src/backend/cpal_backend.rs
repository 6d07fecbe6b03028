//! Capture backend backed by `cpal`.

use super::{AudioBackend, StreamInfo};
use crate::pipeline::AudioIngress;
use crate::{CoreError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, Stream, StreamConfig};
use tracing::{info, warn};

/// Captures from the default input device and feeds channel 0 of every
/// callback block into the pipeline.
pub struct CpalBackend {
    stream: Stream,
    info: StreamInfo,
}

impl CpalBackend {
    /// Open the default input device, preferring f32 at `preferred_rate`.
    pub fn new(ingress: AudioIngress, preferred_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CoreError::Backend("no input device available".into()))?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".into());

        let config = select_input_config(&device, preferred_rate)?;
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        let err_ingress = ingress.clone();
        let err_fn = move |err: cpal::StreamError| {
            err_ingress.record_xrun();
            warn!("audio stream error: {err}");
        };

        // Deinterleave channel 0 into a scratch buffer that is reused
        // across callbacks.
        let stride = channels as usize;
        let mut mono: Vec<f32> = Vec::new();
        let data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
            mono.clear();
            mono.extend(data.iter().step_by(stride).copied());
            ingress.push_block(&mono);
        };

        let stream = device
            .build_input_stream(&config, data_fn, err_fn, None)
            .map_err(|err| CoreError::Backend(format!("failed to open input stream: {err}")))?;

        info!("audio capture configured on '{device_name}' ({channels} ch @ {sample_rate} Hz)");

        Ok(Self {
            stream,
            info: StreamInfo {
                device_name,
                sample_rate,
                channels,
            },
        })
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self) -> Result<()> {
        self.stream
            .play()
            .map_err(|err| CoreError::Backend(format!("failed to start stream: {err}")))
    }

    fn stop(&mut self) {
        if let Err(err) = self.stream.pause() {
            warn!("failed to pause stream: {err}");
        }
    }

    fn info(&self) -> &StreamInfo {
        &self.info
    }
}

/// Pick an f32 input configuration, preferring `preferred_rate` when the
/// device supports it and falling back to the device default otherwise.
fn select_input_config(device: &cpal::Device, preferred_rate: u32) -> Result<StreamConfig> {
    let supported: Vec<_> = device
        .supported_input_configs()
        .map(|configs| configs.collect())
        .unwrap_or_default();

    for range in &supported {
        if range.sample_format() == SampleFormat::F32
            && range.min_sample_rate().0 <= preferred_rate
            && range.max_sample_rate().0 >= preferred_rate
        {
            return Ok(range
                .clone()
                .with_sample_rate(SampleRate(preferred_rate))
                .config());
        }
    }

    if let Some(range) = supported
        .iter()
        .find(|range| range.sample_format() == SampleFormat::F32)
    {
        return Ok(range.clone().with_max_sample_rate().config());
    }

    let default_config = device
        .default_input_config()
        .map_err(|err| CoreError::Backend(format!("no default input config: {err}")))?;
    if default_config.sample_format() != SampleFormat::F32 {
        return Err(CoreError::Backend(format!(
            "unsupported sample format {:?}",
            default_config.sample_format()
        )));
    }
    Ok(default_config.config())
}
