use crate::frame::FrameBuffer;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

#[derive(Debug)]
pub enum NetEvent {
    Text(String),
    Binary(Bytes),
    Connected,
    Disconnected,
}

#[derive(Debug)]
pub enum NetCommand {
    SendText(String),
    SendBinary(FrameBuffer),
}

/// Shared connectivity snapshot. Written only by `NetLink`, read by the
/// audio capture loop to gate frame forwarding.
#[derive(Debug, Clone, Default)]
pub struct LinkState(Arc<AtomicBool>);

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.0.store(connected, Ordering::Release);
    }
}

/// Owns the duplex WebSocket connection to the server.
///
/// Connectivity is binary: every transport-level error collapses into a
/// `Disconnected` event, after which the link retries on a fixed interval
/// until the connection is back. The caller never drives reconnection.
pub struct NetLink {
    url: String,
    reconnect_interval: Duration,
    state: LinkState,
    tx: mpsc::Sender<NetEvent>,
    rx_cmd: mpsc::Receiver<NetCommand>,
}

impl NetLink {
    pub fn new(
        url: String,
        reconnect_interval: Duration,
        tx: mpsc::Sender<NetEvent>,
        rx_cmd: mpsc::Receiver<NetCommand>,
    ) -> Self {
        Self {
            url,
            reconnect_interval,
            state: LinkState::new(),
            tx,
            rx_cmd,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state.clone()
    }

    // 如果发生错误断开连接，固定间隔后重连
    pub async fn run(mut self) {
        loop {
            match self.connect_and_pump().await {
                Err(e) => {
                    log::warn!(
                        "Connection error: {}. Retrying in {}s...",
                        e,
                        self.reconnect_interval.as_secs()
                    );
                    self.state.set_connected(false);
                    let _ = self.tx.send(NetEvent::Disconnected).await;
                    // Frames queued while we were down are stale audio,
                    // never replay them on the next connection.
                    self.drain_pending_commands();
                    tokio::time::sleep(self.reconnect_interval).await;
                    // Senders that have not seen Disconnected yet may have
                    // queued more during the wait.
                    self.drain_pending_commands();
                }
                Ok(()) => {
                    // Command channel closed: the process is going away.
                    break;
                }
            }
        }
    }

    async fn connect_and_pump(&mut self) -> anyhow::Result<()> {
        log::info!("Connecting to {}...", self.url);
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        log::info!("Connected!");

        let (mut write, mut read) = ws_stream.split();

        self.state.set_connected(true);
        self.tx.send(NetEvent::Connected).await?;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.tx.send(NetEvent::Text(text.to_string())).await?;
                        }
                        Some(Ok(Message::Binary(data))) => {
                            self.tx.send(NetEvent::Binary(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            log::info!("Server closed connection: {:?}", frame);
                            anyhow::bail!("connection closed");
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => anyhow::bail!("connection closed"),
                    }
                }
                cmd = self.rx_cmd.recv() => {
                    match cmd {
                        Some(NetCommand::SendText(text)) => {
                            write.send(Message::Text(text.into())).await?;
                        }
                        Some(NetCommand::SendBinary(frame)) => {
                            write.send(Message::Binary(frame.into_bytes())).await?;
                        }
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    fn drain_pending_commands(&mut self) {
        while self.rx_cmd.try_recv().is_ok() {}
    }
}

/// Build the WebSocket URL for a device session.
pub fn session_url(host: &str, port: u16, ws_path: &str, device_id: &str, token: &str) -> String {
    format!("ws://{}:{}{}/{}?token={}", host, port, ws_path, device_id, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn link_state_snapshots_are_shared() {
        let a = LinkState::new();
        let b = a.clone();
        assert!(!b.is_connected());
        a.set_connected(true);
        assert!(b.is_connected());
        a.set_connected(false);
        assert!(!b.is_connected());
    }

    #[test]
    fn session_url_includes_device_and_token() {
        let url = session_url("10.0.0.2", 8080, "/ws", "dev-42", "tok");
        assert_eq!(url, "ws://10.0.0.2:8080/ws/dev-42?token=tok");
    }

    #[tokio::test]
    async fn failed_connect_drops_stale_frames() {
        let (tx_event, mut rx_event) = mpsc::channel(8);
        let (tx_cmd, rx_cmd) = mpsc::channel(8);

        // Nothing listens on this port; the connect attempt fails fast.
        let mut link = NetLink::new(
            "ws://127.0.0.1:1/ws/dev?token=t".to_string(),
            Duration::from_secs(5),
            tx_event,
            rx_cmd,
        );

        tx_cmd
            .send(NetCommand::SendBinary(FrameBuffer::from_samples(vec![0; 4])))
            .await
            .unwrap();

        link.connect_and_pump().await.unwrap_err();
        assert!(!link.state().is_connected());

        link.drain_pending_commands();
        // The queued frame must be gone so a later reconnect cannot replay it.
        assert!(matches!(
            link.rx_cmd.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));
        assert!(rx_event.try_recv().is_err());
    }

    #[tokio::test]
    async fn commands_queued_during_the_retry_wait_are_dropped() {
        let (tx_event, _rx_event) = mpsc::channel(8);
        let (tx_cmd, rx_cmd) = mpsc::channel(8);

        let mut link = NetLink::new(
            "ws://127.0.0.1:1/ws/dev?token=t".to_string(),
            Duration::from_secs(5),
            tx_event,
            rx_cmd,
        );

        link.connect_and_pump().await.unwrap_err();
        link.drain_pending_commands();

        // A sender that has not processed Disconnected yet queues a ping
        // while the link waits out the retry interval.
        tx_cmd
            .send(NetCommand::SendText(r#"{"type":"ping"}"#.to_string()))
            .await
            .unwrap();

        link.drain_pending_commands();
        assert!(matches!(
            link.rx_cmd.try_recv(),
            Err(mpsc::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn reconnect_attempts_are_paced_by_the_interval() {
        let (tx_event, mut rx_event) = mpsc::channel(8);
        let (_tx_cmd, rx_cmd) = mpsc::channel(8);

        let interval = Duration::from_millis(100);
        let link = NetLink::new(
            "ws://127.0.0.1:1/ws/dev?token=t".to_string(),
            interval,
            tx_event,
            rx_cmd,
        );
        let task = tokio::spawn(link.run());

        // Exactly one Disconnected per failed attempt, spaced no closer
        // than the retry interval.
        let first = rx_event.recv().await.unwrap();
        let t1 = Instant::now();
        assert!(matches!(first, NetEvent::Disconnected));

        let second = rx_event.recv().await.unwrap();
        let t2 = Instant::now();
        assert!(matches!(second, NetEvent::Disconnected));

        assert!(t2.duration_since(t1) >= interval);
        task.abort();
    }
}
