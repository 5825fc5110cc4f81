use serde_json::json;
use std::net::UdpSocket;
use std::sync::Mutex;

use crate::presentation::{LED_OFF, LedColor};

/// Status display collaborator. All calls are fire-and-forget.
pub trait Display: Send + Sync {
    fn set_status(&self, text: &str);
    fn set_ptt_label(&self, text: &str);
    fn set_incoming_label(&self, text: &str);
}

/// Single RGB LED collaborator. `set_color` stages the color, `show`
/// latches it onto the strip.
pub trait Led: Send + Sync {
    fn set_color(&self, r: u8, g: u8, b: u8);
    fn show(&self);
}

// 面板进程和Core进程通过本地UDP通信，端口在配置中指定
pub struct PanelBridge {
    socket: UdpSocket,
    target_addr: String,
    pending_color: Mutex<LedColor>,
}

impl PanelBridge {
    pub fn new(local_port: u16, remote_port: u16) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(format!("0.0.0.0:{}", local_port))?;
        let target_addr = format!("127.0.0.1:{}", remote_port);

        Ok(Self {
            socket,
            target_addr,
            pending_color: Mutex::new(LED_OFF),
        })
    }

    fn send(&self, msg: &serde_json::Value) {
        let payload = msg.to_string();
        if let Err(e) = self.socket.send_to(payload.as_bytes(), &self.target_addr) {
            log::warn!("Failed to send panel message: {}", e);
        }
    }
}

impl Display for PanelBridge {
    fn set_status(&self, text: &str) {
        self.send(&json!({"type": "status", "text": text}));
    }

    fn set_ptt_label(&self, text: &str) {
        self.send(&json!({"type": "ptt", "text": text}));
    }

    fn set_incoming_label(&self, text: &str) {
        self.send(&json!({"type": "incoming", "text": text}));
    }
}

impl Led for PanelBridge {
    fn set_color(&self, r: u8, g: u8, b: u8) {
        if let Ok(mut pending) = self.pending_color.lock() {
            *pending = LedColor { r, g, b };
        }
    }

    fn show(&self) {
        let color = match self.pending_color.lock() {
            Ok(pending) => *pending,
            Err(_) => return,
        };
        self.send(&json!({"type": "led", "r": color.r, "g": color.g, "b": color.b}));
    }
}
