//! ALSA PCM device wrappers for audio capture and playback.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result};

use super::{AudioInput, AudioOutput};

fn open_pcm(
    device: &str,
    direction: Direction,
    sample_rate: u32,
    frame_samples: usize,
    dir_name: &str,
) -> Result<PCM> {
    let pcm = PCM::new(device, direction, false)
        .with_context(|| format!("Failed to open PCM device '{}' for {}", device, dir_name))?;

    // Mono S16LE, period sized to one frame
    {
        let hwp = HwParams::any(&pcm).with_context(|| "Failed to initialize HwParams")?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::S16LE)?;
        hwp.set_channels(1)?;
        hwp.set_rate_near(sample_rate, ValueOr::Nearest)?;
        hwp.set_period_size_near(frame_samples as alsa::pcm::Frames, ValueOr::Nearest)?;
        pcm.hw_params(&hwp)?;
    }

    let (actual_rate, period_size) = {
        let hwp = pcm.hw_params_current()?;
        (hwp.get_rate()?, hwp.get_period_size()? as usize)
    };

    log::info!(
        "ALSA {}: device={}, rate={}, period_size={}",
        dir_name,
        device,
        actual_rate,
        period_size,
    );

    Ok(pcm)
}

/// Mono capture device.
pub struct AlsaInput {
    pcm: PCM,
}

impl AlsaInput {
    pub fn open(device: &str, sample_rate: u32, frame_samples: usize) -> Result<Self> {
        let pcm = open_pcm(device, Direction::Capture, sample_rate, frame_samples, "Capture")?;
        Ok(Self { pcm })
    }
}

impl AudioInput for AlsaInput {
    fn read_frame(&mut self, buf: &mut [i16]) -> Result<usize> {
        let io = self.pcm.io_i16()?;
        match io.readi(buf) {
            Ok(frames) => Ok(frames),
            Err(e) => {
                // XRUN: prime the device again before the caller retries
                if let Err(e2) = self.pcm.prepare() {
                    log::error!("Failed to recover PCM capture: {}", e2);
                }
                Err(e.into())
            }
        }
    }
}

/// Mono playback device.
pub struct AlsaOutput {
    pcm: PCM,
}

impl AlsaOutput {
    pub fn open(device: &str, sample_rate: u32, frame_samples: usize) -> Result<Self> {
        let pcm = open_pcm(
            device,
            Direction::Playback,
            sample_rate,
            frame_samples,
            "Playback",
        )?;
        Ok(Self { pcm })
    }
}

impl AudioOutput for AlsaOutput {
    fn write_frame(&mut self, samples: &[i16]) -> Result<usize> {
        let io = self.pcm.io_i16()?;
        match io.writei(samples) {
            Ok(frames) => Ok(frames),
            Err(e) => {
                if let Err(e2) = self.pcm.prepare() {
                    log::error!("Failed to recover PCM playback: {}", e2);
                }
                Err(e.into())
            }
        }
    }
}
