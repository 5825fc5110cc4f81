//! JSON control messages exchanged as WebSocket text frames.

use serde::Serialize;

/// Control messages sent to the server. The wire form is a one-field JSON
/// object, e.g. `{"type":"talk_start"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    TalkStart,
    TalkStop,
    Ping,
}
