//! Fixed-size audio frame, the unit of capture, transmission and playback.

use bytes::Bytes;

/// One frame of mono S16LE samples.
///
/// Frames are always moved, never shared: the capture loop hands them to the
/// network, the controller hands received ones to playback. The sample count
/// is fixed for the life of the process (config `frame_samples`).
#[derive(Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    samples: Vec<i16>,
}

impl FrameBuffer {
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Parse a binary wire payload. Returns `None` when the payload does not
    /// hold exactly `expected_samples` little-endian i16 samples.
    pub fn from_bytes(expected_samples: usize, data: &[u8]) -> Option<Self> {
        if data.len() != expected_samples * 2 {
            return None;
        }
        let samples = data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Some(Self { samples })
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consume the frame into its little-endian wire representation.
    pub fn into_bytes(self) -> Bytes {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for s in self.samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        Bytes::from(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_little_endian() {
        let frame = FrameBuffer::from_samples(vec![1, -2, 0x1234]);
        let bytes = frame.into_bytes();
        assert_eq!(&bytes[..], &[0x01, 0x00, 0xFE, 0xFF, 0x34, 0x12]);

        let back = FrameBuffer::from_bytes(3, &bytes).unwrap();
        assert_eq!(back.samples(), &[1, -2, 0x1234]);
    }

    #[test]
    fn rejects_wrong_length_payloads() {
        assert!(FrameBuffer::from_bytes(2, &[0, 0, 0]).is_none());
        assert!(FrameBuffer::from_bytes(2, &[0, 0]).is_none());
        assert!(FrameBuffer::from_bytes(2, &[0, 0, 0, 0, 0, 0]).is_none());
        assert!(FrameBuffer::from_bytes(2, &[0, 0, 0, 0]).is_some());
    }
}
