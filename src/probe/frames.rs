//! Raster frame comparison.

use super::error::CaptureError;
use std::time::Duration;

/// One decoded greyscale raster sample. Opaque beyond pixel comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Build a frame, checking the buffer matches `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CaptureError::FrameSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame with every pixel set to `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width as usize * height as usize],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Mean absolute per-pixel difference, or `None` if sizes differ.
    pub fn mean_abs_diff(&self, other: &Frame) -> Option<f64> {
        if self.dimensions() != other.dimensions() {
            return None;
        }
        if self.pixels.is_empty() {
            return Some(0.0);
        }

        let total: u64 = self
            .pixels
            .iter()
            .zip(&other.pixels)
            .map(|(a, b)| a.abs_diff(*b) as u64)
            .sum();
        Some(total as f64 / self.pixels.len() as f64)
    }
}

/// Frame-derived activity signals for one sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAnalysis {
    pub fps: f64,
    pub is_buffering: bool,
    pub is_active: bool,
    pub distinct_frames: usize,
}

impl FrameAnalysis {
    /// Analyse frames sampled in order over `window`.
    ///
    /// Consecutive frames differing by more than `epsilon` count as distinct;
    /// fps is distinct frames per second of window. Activity compares frames
    /// roughly `gap` apart against `motion_floor`. Mismatched frame sizes
    /// count as a content change.
    pub fn from_frames(
        frames: &[Frame],
        window: Duration,
        gap: Duration,
        epsilon: f64,
        motion_floor: f64,
    ) -> Self {
        if frames.is_empty() {
            return Self {
                fps: 0.0,
                is_buffering: true,
                is_active: false,
                distinct_frames: 0,
            };
        }

        let changed = |a: &Frame, b: &Frame, floor: f64| {
            a.mean_abs_diff(b).map_or(true, |d| d > floor)
        };

        let distinct_frames = 1 + frames
            .windows(2)
            .filter(|pair| changed(&pair[0], &pair[1], epsilon))
            .count();

        let window_secs = window.as_secs_f64();
        let fps = if window_secs > 0.0 {
            distinct_frames as f64 / window_secs
        } else {
            0.0
        };

        let is_buffering = distinct_frames == 1;

        let is_active = if frames.len() < 2 || window.is_zero() {
            false
        } else {
            let per_gap = frames.len() as f64 * gap.as_secs_f64() / window_secs;
            let stride = (per_gap.round() as usize).clamp(1, frames.len() - 1);
            frames
                .iter()
                .zip(frames.iter().skip(stride))
                .any(|(a, b)| changed(a, b, motion_floor))
        };

        Self {
            fps,
            is_buffering,
            is_active,
            distinct_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(1);
    const GAP: Duration = Duration::from_millis(200);

    fn ramp(count: usize, step: u8) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::filled(8, 8, (i as u8).wrapping_mul(step)))
            .collect()
    }

    #[test]
    fn test_frame_size_checked() {
        let err = Frame::new(4, 4, vec![0; 10]).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::FrameSize {
                expected: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_mean_abs_diff() {
        let a = Frame::filled(2, 2, 10);
        let b = Frame::filled(2, 2, 30);
        assert_eq!(a.mean_abs_diff(&b), Some(20.0));
        assert_eq!(b.mean_abs_diff(&a), Some(20.0));
        assert_eq!(a.mean_abs_diff(&a), Some(0.0));
    }

    #[test]
    fn test_mean_abs_diff_size_mismatch() {
        let a = Frame::filled(2, 2, 10);
        let b = Frame::filled(3, 2, 10);
        assert_eq!(a.mean_abs_diff(&b), None);
    }

    #[test]
    fn test_frozen_frames_are_buffering() {
        let frames = vec![Frame::filled(8, 8, 42); 25];
        let a = FrameAnalysis::from_frames(&frames, WINDOW, GAP, 0.5, 2.0);
        assert!(a.is_buffering);
        assert!(!a.is_active);
        assert_eq!(a.distinct_frames, 1);
        assert_eq!(a.fps, 1.0);
    }

    #[test]
    fn test_moving_frames_are_active() {
        let frames = ramp(25, 5);
        let a = FrameAnalysis::from_frames(&frames, WINDOW, GAP, 0.5, 2.0);
        assert!(!a.is_buffering);
        assert!(a.is_active);
        assert_eq!(a.distinct_frames, 25);
        assert_eq!(a.fps, 25.0);
    }

    #[test]
    fn test_noise_below_floor_is_not_motion() {
        // Every frame differs by 1 grey level: distinct, but under the motion floor
        let frames: Vec<Frame> = (0..10).map(|i| Frame::filled(8, 8, 100 + (i % 2))).collect();
        let a = FrameAnalysis::from_frames(&frames, WINDOW, GAP, 0.5, 2.0);
        assert!(!a.is_buffering);
        assert!(!a.is_active);
    }

    #[test]
    fn test_no_frames() {
        let a = FrameAnalysis::from_frames(&[], WINDOW, GAP, 0.5, 2.0);
        assert_eq!(a.fps, 0.0);
        assert!(a.is_buffering);
        assert!(!a.is_active);
    }

    #[test]
    fn test_two_frames_use_stride_one() {
        let frames = vec![Frame::filled(4, 4, 0), Frame::filled(4, 4, 200)];
        let a = FrameAnalysis::from_frames(&frames, Duration::from_millis(200), GAP, 0.5, 2.0);
        assert!(a.is_active);
        assert_eq!(a.distinct_frames, 2);
        assert_eq!(a.fps, 10.0);
    }
}
