//! pttlink - push-to-talk audio client for embedded Linux devices.
//!
//! Authenticates against the PTT server, keeps one duplex WebSocket open,
//! streams raw microphone frames while the button is held, plays back
//! frames pushed from the server, and drives a status panel + RGB LED.

pub mod audio;
pub mod auth;
pub mod button;
pub mod config;
pub mod controller;
pub mod frame;
pub mod net_link;
pub mod panel;
pub mod presentation;
pub mod protocol;
