use super::AudioOutput;
use crate::frame::FrameBuffer;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Continuous playback loop: frames routed from the link are written
/// straight to the output device. There is no jitter buffer; a slow device
/// backpressures the channel and, through it, the event dispatch.
pub fn playback_loop(
    output: &mut dyn AudioOutput,
    rx: &mut mpsc::Receiver<FrameBuffer>,
    running: &AtomicBool,
) {
    while running.load(Ordering::Relaxed) {
        match rx.blocking_recv() {
            Some(frame) => {
                let samples = frame.samples();
                let mut written = 0;
                let mut retries = 0u32;
                while written < samples.len() {
                    match output.write_frame(&samples[written..]) {
                        Ok(n) if n > 0 => {
                            written += n;
                            retries = 0;
                        }
                        Ok(_) => {
                            retries += 1;
                        }
                        Err(e) => {
                            log::warn!("Audio playback error: {}, recovering...", e);
                            retries += 1;
                        }
                    }
                    // The device keeps refusing samples; drop the remainder
                    // of this frame rather than spin.
                    if retries >= 3 {
                        log::error!(
                            "Max recovery retries reached. Dropping {} unwritten samples.",
                            samples.len() - written
                        );
                        break;
                    }
                }
            }
            None => {
                log::info!("Playback channel closed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingOutput {
        written: Vec<i16>,
        chunk: usize,
    }

    impl AudioOutput for RecordingOutput {
        fn write_frame(&mut self, samples: &[i16]) -> anyhow::Result<usize> {
            let n = samples.len().min(self.chunk);
            self.written.extend_from_slice(&samples[..n]);
            Ok(n)
        }
    }

    #[test]
    fn writes_every_routed_frame_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.blocking_send(FrameBuffer::from_samples(vec![1, 2, 3, 4]))
            .unwrap();
        tx.blocking_send(FrameBuffer::from_samples(vec![5, 6, 7, 8]))
            .unwrap();
        drop(tx);

        let mut output = RecordingOutput {
            written: Vec::new(),
            chunk: 4,
        };
        let running = AtomicBool::new(true);
        playback_loop(&mut output, &mut rx, &running);

        assert_eq!(output.written, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn short_writes_complete_the_frame() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.blocking_send(FrameBuffer::from_samples(vec![9, 8, 7, 6]))
            .unwrap();
        drop(tx);

        // Device accepts at most 3 samples per write.
        let mut output = RecordingOutput {
            written: Vec::new(),
            chunk: 3,
        };
        let running = AtomicBool::new(true);
        playback_loop(&mut output, &mut rx, &running);

        assert_eq!(output.written, vec![9, 8, 7, 6]);
    }
}
