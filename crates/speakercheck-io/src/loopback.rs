//! Device-free backend that feeds playback straight back into capture.
//!
//! [`LoopbackBackend`] models an ideal speaker and microphone: every output
//! block is mixed to mono, scaled by a gain, delayed by a fixed latency and
//! delivered to the registered input callback on every input channel. It
//! lets the full measurement path run in tests and on machines without audio
//! hardware.

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle,
};
use crate::{AudioDevice, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Name reported for the virtual device.
const DEVICE_NAME: &str = "loopback";

type InputSlot = Arc<Mutex<Option<(InputCallback, u16)>>>;

/// Virtual audio backend routing output to input.
pub struct LoopbackBackend {
    latency_samples: usize,
    gain: f32,
    speed: f64,
    input: InputSlot,
}

impl LoopbackBackend {
    /// Create a loopback with `latency_samples` of delay and linear `gain`.
    pub fn new(latency_samples: usize, gain: f32) -> Self {
        Self {
            latency_samples,
            gain,
            speed: 1.0,
            input: Arc::new(Mutex::new(None)),
        }
    }

    /// Run the virtual clock `speed` times faster than real time.
    ///
    /// A non-positive or non-finite speed disables pacing entirely.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Delay between output and input in samples.
    pub fn latency_samples(&self) -> usize {
        self.latency_samples
    }

    /// Linear gain applied on the way back.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    fn device(sample_rate: u32) -> AudioDevice {
        AudioDevice {
            name: DEVICE_NAME.to_string(),
            is_input: true,
            is_output: true,
            default_sample_rate: sample_rate,
        }
    }

    fn block_period(&self, frames: usize, sample_rate: u32) -> Option<Duration> {
        if !(self.speed.is_finite() && self.speed > 0.0) || sample_rate == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(
            frames as f64 / f64::from(sample_rate) / self.speed,
        ))
    }
}

impl Default for LoopbackBackend {
    fn default() -> Self {
        Self::new(0, 1.0)
    }
}

/// Clears the registered input callback when capture stops.
struct InputRegistration(InputSlot);

impl Drop for InputRegistration {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.0.lock() {
            slot.take();
        }
    }
}

/// Stops and joins the playback worker.
struct PlaybackWorker {
    alive: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for PlaybackWorker {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("loopback playback thread panicked");
        }
    }
}

impl AudioBackend for LoopbackBackend {
    fn name(&self) -> &'static str {
        DEVICE_NAME
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![Self::device(BackendStreamConfig::default().sample_rate)])
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(Some(Self::device(BackendStreamConfig::default().sample_rate)))
    }

    fn default_input_device(&self) -> Result<Option<AudioDevice>> {
        Ok(Some(Self::device(BackendStreamConfig::default().sample_rate)))
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let channels = usize::from(config.channels.max(1));
        let frames = (config.buffer_size as usize).max(1);
        let period = self.block_period(frames, config.sample_rate);
        let gain = self.gain;
        let input = Arc::clone(&self.input);
        let alive = Arc::new(AtomicBool::new(true));

        let mut delay: VecDeque<f32> = std::iter::repeat_n(0.0, self.latency_samples).collect();
        let worker_alive = Arc::clone(&alive);
        let thread = std::thread::Builder::new()
            .name("loopback-playback".to_string())
            .spawn(move || {
                let mut block = vec![0.0f32; frames * channels];
                let mut captured = Vec::new();
                while worker_alive.load(Ordering::Acquire) {
                    block.fill(0.0);
                    callback(&mut block);
                    delay.extend(
                        block
                            .chunks_exact(channels)
                            .map(|frame| frame.iter().sum::<f32>() * gain),
                    );

                    if let Ok(mut slot) = input.lock()
                        && let Some((input_callback, input_channels)) = slot.as_mut()
                    {
                        let in_ch = usize::from((*input_channels).max(1));
                        captured.clear();
                        for sample in delay.drain(..frames) {
                            captured.extend(std::iter::repeat_n(sample, in_ch));
                        }
                        input_callback(&captured);
                    } else {
                        delay.drain(..frames);
                    }

                    if let Some(period) = period {
                        std::thread::sleep(period);
                    }
                }
            })?;

        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            latency = self.latency_samples,
            "loopback output started"
        );
        Ok(StreamHandle::new(PlaybackWorker {
            alive,
            thread: Some(thread),
        }))
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        if let Ok(mut slot) = self.input.lock() {
            *slot = Some((callback, config.channels));
        }
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            "loopback input started"
        );
        Ok(StreamHandle::new(InputRegistration(Arc::clone(&self.input))))
    }
}
