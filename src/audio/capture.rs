use super::AudioInput;
use crate::controller::PttFlag;
use crate::frame::FrameBuffer;
use crate::net_link::{LinkState, NetCommand};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Continuous capture loop.
///
/// Blocks until exactly one frame of samples is available, then forwards it
/// iff PTT is active and the link is connected at that instant. Frames
/// captured outside that gate are dropped, never queued — including the
/// frame that may span the activation edge itself.
pub fn capture_loop(
    input: &mut dyn AudioInput,
    frame_samples: usize,
    ptt: &PttFlag,
    link: &LinkState,
    net_tx: &mpsc::Sender<NetCommand>,
    running: &AtomicBool,
) {
    let mut buf = vec![0i16; frame_samples];

    while running.load(Ordering::Relaxed) {
        // Accumulate one full frame; short reads keep going.
        let mut filled = 0;
        let mut failed = false;
        while filled < frame_samples {
            match input.read_frame(&mut buf[filled..]) {
                Ok(0) => return,
                Ok(n) => filled += n,
                Err(e) => {
                    log::warn!("Audio capture error: {}, skipping frame", e);
                    failed = true;
                    break;
                }
            }
        }
        if failed {
            std::thread::sleep(std::time::Duration::from_millis(10));
            continue;
        }

        // Gate at capture completion. Dropped frames are gone for good.
        if !(ptt.is_active() && link.is_connected()) {
            continue;
        }

        let samples = std::mem::replace(&mut buf, vec![0i16; frame_samples]);
        match net_tx.try_send(NetCommand::SendBinary(FrameBuffer::from_samples(samples))) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Bounded outbound queue: drop the newest frame rather than
                // block the capture thread behind a slow link.
                log::warn!("Outbound queue full, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return,
        }
    }
}
