//! Playback-while-recording measurement session.
//!
//! A [`MeasurementContext`] owns one audio backend for the lifetime of a
//! session. Each [`run`](MeasurementContext::run) opens capture first, then
//! playback, records until the excitation plus the configured tail has been
//! captured, and closes both streams before returning. Capture starts before
//! playback, so the recording begins with a stretch of silence that onset
//! detection later skips.

use crate::backend::{AudioBackend, BackendStreamConfig};
use crate::signal::Excitation;
use crate::{Error, Result};
use speakercheck_analysis::Waveform;
use speakercheck_config::{Channel, MeasurementSettings};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Capture blocks buffered between the audio thread and the session.
const CAPTURE_QUEUE_BLOCKS: usize = 1024;

/// How often the session wakes to check the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Capture silence after which the run fails.
const STALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of one measurement run.
#[derive(Debug, Clone)]
pub struct Measurement {
    /// Captured response, first input channel only.
    pub recording: Waveform,
    /// Frames of excitation that were played.
    pub excitation_frames: usize,
    /// Capture blocks lost because the session fell behind.
    pub dropped_blocks: usize,
    /// Whether the run was stopped before the full duration was captured.
    pub cancelled: bool,
}

/// Audio session that plays excitations and records the response.
pub struct MeasurementContext {
    backend: Box<dyn AudioBackend>,
    settings: MeasurementSettings,
    stop: Arc<AtomicBool>,
}

impl MeasurementContext {
    /// Open a session on `backend` with `settings`.
    pub fn new(backend: Box<dyn AudioBackend>, settings: MeasurementSettings) -> Self {
        tracing::debug!(backend = backend.name(), "measurement context opened");
        Self {
            backend,
            settings,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Settings this session measures with.
    pub fn settings(&self) -> &MeasurementSettings {
        &self.settings
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Flag that stops the current run when set.
    ///
    /// A stopped run returns what was captured so far with
    /// [`Measurement::cancelled`] set. The flag is cleared at the start of
    /// every run.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Play `excitation` on `channel` and record the response.
    pub fn run(&mut self, excitation: &Excitation, channel: Channel) -> Result<Measurement> {
        self.run_with_progress(excitation, channel, |_| {})
    }

    /// Like [`run`](Self::run), reporting capture progress in `[0, 1]`.
    pub fn run_with_progress(
        &mut self,
        excitation: &Excitation,
        channel: Channel,
        mut progress: impl FnMut(f32),
    ) -> Result<Measurement> {
        self.stop.store(false, Ordering::SeqCst);

        let output_config = BackendStreamConfig::playback(&self.settings);
        let sample_rate = self.backend.actual_sample_rate(&output_config);
        if sample_rate != self.settings.sample_rate {
            tracing::warn!(
                requested = self.settings.sample_rate,
                actual = sample_rate,
                "device runs at a different sample rate"
            );
        }
        let output_config = BackendStreamConfig {
            sample_rate,
            ..output_config
        };
        let input_config = BackendStreamConfig {
            sample_rate,
            ..BackendStreamConfig::capture(&self.settings)
        };

        let signal = excitation.render_panned(
            sample_rate,
            self.settings.amplitude,
            channel,
            output_config.channels,
        )?;
        let out_ch = usize::from(output_config.channels);
        let in_ch = usize::from(input_config.channels);
        let excitation_frames = signal.len() / out_ch;
        let tail_frames = (self.settings.tail_secs.max(0.0) * sample_rate as f32) as usize;
        let target_frames = excitation_frames + tail_frames;

        tracing::info!(
            test = %excitation.test_type(),
            %channel,
            sample_rate,
            frames = target_frames,
            "starting measurement"
        );

        let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(CAPTURE_QUEUE_BLOCKS);
        let dropped = Arc::new(AtomicUsize::new(0));
        let input_dropped = Arc::clone(&dropped);
        let input = self.backend.build_input_stream(
            &input_config,
            Box::new(move |data| {
                if tx.try_send(data.to_vec()).is_err() {
                    input_dropped.fetch_add(1, Ordering::Relaxed);
                }
            }),
            Box::new(|err| tracing::error!(error = err, "capture stream error")),
        )?;

        let position = Arc::new(AtomicUsize::new(0));
        let playback_position = Arc::clone(&position);
        let output = self.backend.build_output_stream(
            &output_config,
            Box::new(move |data| {
                let start = playback_position.load(Ordering::Relaxed).min(signal.len());
                let n = data.len().min(signal.len() - start);
                data[..n].copy_from_slice(&signal[start..start + n]);
                data[n..].fill(0.0);
                playback_position.store(start + n, Ordering::Relaxed);
            }),
            Box::new(|err| tracing::error!(error = err, "playback stream error")),
        )?;

        let mut captured: Vec<f32> = Vec::with_capacity(target_frames * in_ch);
        let mut cancelled = false;
        let mut last_block = Instant::now();
        while captured.len() / in_ch < target_frames {
            if self.stop.load(Ordering::SeqCst) {
                cancelled = true;
                tracing::warn!(
                    captured = captured.len() / in_ch,
                    expected = target_frames,
                    "measurement stopped early"
                );
                break;
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(block) => {
                    captured.extend_from_slice(&block);
                    last_block = Instant::now();
                    progress((captured.len() / in_ch) as f32 / target_frames.max(1) as f32);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if last_block.elapsed() > STALL_TIMEOUT {
                        return Err(Error::Stream("capture stalled".to_string()));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Stream("capture stream closed".to_string()));
                }
            }
        }

        drop(output);
        drop(input);

        captured.truncate(target_frames * in_ch);
        let dropped_blocks = dropped.load(Ordering::Relaxed);
        if dropped_blocks > 0 {
            tracing::warn!(blocks = dropped_blocks, "capture blocks dropped");
        }
        if !cancelled {
            progress(1.0);
        }
        tracing::info!(
            frames = captured.len() / in_ch,
            played = position.load(Ordering::Relaxed) / out_ch,
            "measurement finished"
        );

        Ok(Measurement {
            recording: Waveform::from_interleaved(&captured, in_ch, sample_rate as f32),
            excitation_frames,
            dropped_blocks,
            cancelled,
        })
    }

    /// End the session and release the backend.
    pub fn close(self) {
        tracing::debug!(backend = self.backend.name(), "measurement context closed");
    }
}
