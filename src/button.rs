//! PTT button monitor: periodic poll with edge detection.
//!
//! Electrical debounce is the board's job; this task only turns level
//! samples into activate/deactivate edges. The edges travel over a channel,
//! which makes the once-per-edge delivery explicit instead of sharing a
//! flag between tasks.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PttEvent {
    Activated,
    Deactivated,
}

pub trait Button: Send {
    /// Sample the debounced button. `true` means pressed.
    fn read_pressed(&mut self) -> anyhow::Result<bool>;
}

/// Active-low button exported through sysfs GPIO.
pub struct SysfsButton {
    path: PathBuf,
}

impl SysfsButton {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Button for SysfsButton {
    fn read_pressed(&mut self) -> anyhow::Result<bool> {
        let raw = std::fs::read_to_string(&self.path)?;
        // Active-low: the line reads 0 while the button is held.
        Ok(raw.trim() == "0")
    }
}

/// Two-state edge detector over successive level samples.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    pressed: bool,
}

impl EdgeDetector {
    pub fn update(&mut self, pressed_now: bool) -> Option<PttEvent> {
        match (self.pressed, pressed_now) {
            (false, true) => {
                self.pressed = true;
                Some(PttEvent::Activated)
            }
            (true, false) => {
                self.pressed = false;
                Some(PttEvent::Deactivated)
            }
            _ => None,
        }
    }
}

/// Poll the button forever, publishing one event per edge.
pub async fn poll_task(
    mut button: impl Button + 'static,
    poll_interval: Duration,
    tx: mpsc::Sender<PttEvent>,
) {
    let mut edges = EdgeDetector::default();
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        ticker.tick().await;
        match button.read_pressed() {
            Ok(level) => {
                if let Some(event) = edges.update(level) {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                // Keep the previous state; a failed sample is not a release.
                log::warn!("Button read failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(levels: &[bool]) -> Vec<PttEvent> {
        let mut edges = EdgeDetector::default();
        levels.iter().filter_map(|&l| edges.update(l)).collect()
    }

    #[test]
    fn emits_one_event_per_edge() {
        assert_eq!(
            events(&[false, true, true, true, false, false]),
            vec![PttEvent::Activated, PttEvent::Deactivated]
        );
    }

    #[test]
    fn held_level_emits_nothing() {
        assert_eq!(events(&[false, false, false]), vec![]);
        assert_eq!(events(&[true, true, true]), vec![PttEvent::Activated]);
    }

    #[test]
    fn rapid_toggling_alternates_events() {
        assert_eq!(
            events(&[true, false, true, false]),
            vec![
                PttEvent::Activated,
                PttEvent::Deactivated,
                PttEvent::Activated,
                PttEvent::Deactivated,
            ]
        );
    }
}
