//! Audio pipeline: capture and playback of raw PCM frames.
//!
//! Uses std::thread (NOT tokio tasks) for real-time audio I/O to avoid
//! contention with async network tasks. Audio is carried uncompressed:
//! one fixed-size mono S16LE frame is the unit in both directions.

mod alsa_device;
mod capture;
mod playback;

pub use alsa_device::{AlsaInput, AlsaOutput};
pub use capture::capture_loop;
pub use playback::playback_loop;

use crate::controller::PttFlag;
use crate::frame::FrameBuffer;
use crate::net_link::{LinkState, NetCommand};
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

/// Blocking frame source. `read_frame` fills as much of `buf` as the device
/// delivers and returns the sample count; 0 means the source is gone.
pub trait AudioInput: Send {
    fn read_frame(&mut self, buf: &mut [i16]) -> Result<usize>;
}

/// Blocking frame sink. Returns the number of samples accepted.
pub trait AudioOutput: Send {
    fn write_frame(&mut self, samples: &[i16]) -> Result<usize>;
}

/// Audio pipeline configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// ALSA capture device name (e.g. "default", "plughw:0,0")
    pub capture_device: String,
    /// ALSA playback device name
    pub playback_device: String,
    /// Sample rate, fixed for the process
    pub sample_rate: u32,
    /// Samples per frame, the send/receive unit
    pub frame_samples: usize,
}

/// Runs capture and playback in dedicated OS threads.
///
/// - Capture thread: ALSA capture → (PTT ∧ connected gate) → `net_tx`
/// - Playback thread: `playback_rx` → ALSA playback
pub struct AudioSystem {
    running: Arc<AtomicBool>,
    capture_handle: Option<JoinHandle<()>>,
    play_handle: Option<JoinHandle<()>>,
}

impl AudioSystem {
    pub fn start(
        config: AudioConfig,
        net_tx: mpsc::Sender<NetCommand>,
        playback_rx: mpsc::Receiver<FrameBuffer>,
        ptt: PttFlag,
        link: LinkState,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));

        log::info!(
            "AudioSystem starting — capture: \"{}\", playback: \"{}\", rate: {}Hz, frame: {} samples",
            config.capture_device,
            config.playback_device,
            config.sample_rate,
            config.frame_samples,
        );

        let capture_handle = {
            let running = running.clone();
            let config = config.clone();
            thread::Builder::new()
                .name("audio-capture".into())
                .spawn(move || {
                    match AlsaInput::open(
                        &config.capture_device,
                        config.sample_rate,
                        config.frame_samples,
                    ) {
                        Ok(mut input) => {
                            capture_loop(
                                &mut input,
                                config.frame_samples,
                                &ptt,
                                &link,
                                &net_tx,
                                &running,
                            );
                        }
                        Err(e) => log::error!("Failed to open capture device: {}", e),
                    }
                })?
        };

        let play_handle = {
            let running = running.clone();
            let config = config.clone();
            thread::Builder::new().name("audio-play".into()).spawn(
                move || {
                    // Small delay to let the capture device initialize first
                    thread::sleep(std::time::Duration::from_secs(1));
                    match AlsaOutput::open(
                        &config.playback_device,
                        config.sample_rate,
                        config.frame_samples,
                    ) {
                        Ok(mut output) => {
                            let mut rx = playback_rx;
                            playback_loop(&mut output, &mut rx, &running);
                        }
                        Err(e) => log::error!("Failed to open playback device: {}", e),
                    }
                },
            )?
        };

        Ok(Self {
            running,
            capture_handle: Some(capture_handle),
            play_handle: Some(play_handle),
        })
    }

    /// Signal threads to stop and wait for the capture thread to finish.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(h) = self.capture_handle.take() {
            let _ = h.join();
        }
        // Playback thread exits when the channel sender is dropped.
        self.play_handle.take();
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}
