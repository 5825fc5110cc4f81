//! Pure mapping from session state to LED color and panel labels.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const LED_OFF: LedColor = LedColor { r: 0, g: 0, b: 0 };
pub const LED_GREEN: LedColor = LedColor { r: 0, g: 255, b: 0 };
pub const LED_AMBER: LedColor = LedColor { r: 255, g: 160, b: 0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub ptt_label: &'static str,
    pub incoming_label: &'static str,
    pub led: LedColor,
}

/// Reduce the current session state to one presentation row.
///
/// An active PTT always wins: a user who is talking never sees the
/// incoming indication.
pub fn reduce(ptt_active: bool, incoming: bool) -> Presentation {
    if ptt_active {
        Presentation {
            ptt_label: "TALKING",
            incoming_label: "",
            led: LED_GREEN,
        }
    } else if incoming {
        Presentation {
            ptt_label: "HOLD TO TALK",
            incoming_label: "INCOMING",
            led: LED_AMBER,
        }
    } else {
        Presentation {
            ptt_label: "HOLD TO TALK",
            incoming_label: "",
            led: LED_OFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn talking_row() {
        let p = reduce(true, false);
        assert_eq!(p.ptt_label, "TALKING");
        assert_eq!(p.incoming_label, "");
        assert_eq!(p.led, LED_GREEN);
    }

    #[test]
    fn incoming_row() {
        let p = reduce(false, true);
        assert_eq!(p.ptt_label, "HOLD TO TALK");
        assert_eq!(p.incoming_label, "INCOMING");
        assert_eq!(p.led, LED_AMBER);
    }

    #[test]
    fn idle_row() {
        let p = reduce(false, false);
        assert_eq!(p.ptt_label, "HOLD TO TALK");
        assert_eq!(p.incoming_label, "");
        assert_eq!(p.led, LED_OFF);
    }

    #[test]
    fn ptt_wins_over_incoming() {
        assert_eq!(reduce(true, true), reduce(true, false));
    }
}
