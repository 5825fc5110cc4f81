use crate::button::PttEvent;
use crate::frame::FrameBuffer;
use crate::net_link::{NetCommand, NetEvent};
use crate::panel::{Display, Led};
use crate::presentation::{self, Presentation};
use crate::protocol::ControlMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Shared PTT snapshot. Written only by the controller on button edges,
/// read by the audio capture loop to gate frame forwarding.
#[derive(Debug, Clone, Default)]
pub struct PttFlag(Arc<AtomicBool>);

impl PttFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.0.store(active, Ordering::Release);
    }
}

/// Tracks the recency of inbound audio. "Incoming" stays indicated for a
/// fixed decay window after the last received frame.
#[derive(Debug)]
pub struct IncomingIndicator {
    last_rx: Option<Instant>,
    window: Duration,
}

impl IncomingIndicator {
    pub fn new(window: Duration) -> Self {
        Self {
            last_rx: None,
            window,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_rx = Some(now);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        match self.last_rx {
            Some(t) => now.duration_since(t) < self.window,
            None => false,
        }
    }
}

/// Orchestrates the session: consumes button edges and link events, drives
/// the presentation, and owns the keepalive.
pub struct SessionController {
    ptt_active: bool,
    connected: bool,
    indicator: IncomingIndicator,
    shown: Presentation,
    ptt_flag: PttFlag,
    net_tx: mpsc::Sender<NetCommand>,
    playback_tx: mpsc::Sender<FrameBuffer>,
    display: Arc<dyn Display>,
    led: Arc<dyn Led>,
    frame_samples: usize,
}

impl SessionController {
    pub fn new(
        net_tx: mpsc::Sender<NetCommand>,
        playback_tx: mpsc::Sender<FrameBuffer>,
        ptt_flag: PttFlag,
        display: Arc<dyn Display>,
        led: Arc<dyn Led>,
        frame_samples: usize,
        incoming_decay: Duration,
    ) -> Self {
        Self {
            ptt_active: false,
            connected: false,
            indicator: IncomingIndicator::new(incoming_decay),
            shown: presentation::reduce(false, false),
            ptt_flag,
            net_tx,
            playback_tx,
            display,
            led,
            frame_samples,
        }
    }

    pub async fn handle_ptt_event(&mut self, event: PttEvent, now: Instant) {
        let active = matches!(event, PttEvent::Activated);
        // Set, never toggle: a duplicate edge leaves the state unchanged.
        if self.ptt_active == active {
            return;
        }
        self.ptt_active = active;
        self.ptt_flag.set_active(active);

        if self.connected {
            let msg = if active {
                ControlMessage::TalkStart
            } else {
                ControlMessage::TalkStop
            };
            self.send_control(msg).await;
        }
        self.render(now);
    }

    pub async fn handle_net_event(&mut self, event: NetEvent, now: Instant) {
        match event {
            NetEvent::Connected => {
                log::info!("Link up");
                self.connected = true;
                self.display.set_status("Ready");
                self.render(now);
            }
            NetEvent::Disconnected => {
                log::warn!("Link down");
                self.connected = false;
                self.display.set_status("Reconnecting...");
                self.render(now);
            }
            NetEvent::Binary(data) => {
                match FrameBuffer::from_bytes(self.frame_samples, &data) {
                    Some(frame) => {
                        // Both effects belong to this one event: the recency
                        // mark and the handoff to playback.
                        self.indicator.mark(now);
                        if self.playback_tx.send(frame).await.is_err() {
                            log::error!("Playback channel closed, dropping frame");
                        }
                        self.render(now);
                    }
                    None => {
                        log::warn!("Discarding malformed audio frame ({} bytes)", data.len());
                    }
                }
            }
            NetEvent::Text(text) => {
                log::debug!("Server text: {}", text);
            }
        }
    }

    /// Timer-driven keepalive. Fire-and-forget, no pong tracking.
    pub async fn keepalive(&mut self) {
        if self.connected {
            self.send_control(ControlMessage::Ping).await;
        }
    }

    /// Re-evaluate the incoming indication; renders only on a transition.
    pub fn tick(&mut self, now: Instant) {
        let incoming = self.indicator.is_active(now);
        if presentation::reduce(self.ptt_active, incoming) != self.shown {
            self.render(now);
        }
    }

    pub fn render(&mut self, now: Instant) {
        let p = presentation::reduce(self.ptt_active, self.indicator.is_active(now));
        self.display.set_ptt_label(p.ptt_label);
        self.display.set_incoming_label(p.incoming_label);
        self.led.set_color(p.led.r, p.led.g, p.led.b);
        self.led.show();
        self.shown = p;
    }

    async fn send_control(&self, msg: ControlMessage) {
        let payload = match serde_json::to_string(&msg) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Failed to encode control message: {}", e);
                return;
            }
        };
        if let Err(e) = self.net_tx.send(NetCommand::SendText(payload)).await {
            log::error!("Failed to queue control message: {}", e);
        }
    }
}
