use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::units::Magnitude;
use super::window::hann_window;
use crate::error::{AnalysisError, Result};

/// One-sided magnitude spectrogram, frame-major.
#[derive(Debug, Clone, PartialEq)]
pub struct StftMatrix {
    pub frame_size: usize,
    pub hop_size: usize,
    pub frames: Vec<Vec<Magnitude>>,
}

impl StftMatrix {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// `frame_size / 2 + 1`, independent of whether any frame exists.
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }
}

/// Number of frames the transform emits for a signal of `signal_len` samples:
/// `ceil((signal_len - frame_size) / hop_size) + 1`, or zero when that is
/// not positive.
pub fn frame_count(signal_len: usize, frame_size: usize, hop_size: usize) -> usize {
    if signal_len >= frame_size {
        (signal_len - frame_size).div_ceil(hop_size) + 1
    } else {
        // ceil of a negative quotient rounds toward zero
        let behind = (frame_size - signal_len) / hop_size;
        1usize.saturating_sub(behind)
    }
}

/// Windowed short-time Fourier transform with a plan shared across frames.
pub struct Stft {
    frame_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(frame_size: usize, hop_size: usize) -> Result<Self> {
        if frame_size < 2 || !frame_size.is_power_of_two() {
            return Err(AnalysisError::invalid(format!(
                "frame size must be a power of two >= 2, got {frame_size}"
            )));
        }
        if hop_size == 0 {
            return Err(AnalysisError::invalid("hop size must be positive"));
        }

        let mut planner = FftPlanner::<f32>::new();
        Ok(Stft {
            frame_size,
            hop_size,
            window: hann_window(frame_size),
            fft: planner.plan_fft_forward(frame_size),
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Magnitudes of every frame. Frames past the end of `signal` are
    /// zero-padded; the result may contain exact zeros.
    pub fn magnitudes(&self, signal: &[f32]) -> StftMatrix {
        let num_frames = frame_count(signal.len(), self.frame_size, self.hop_size);
        let num_bins = self.frame_size / 2 + 1;
        let scratch_len = self.fft.get_inplace_scratch_len();

        log::debug!(
            "STFT: {} samples -> {} frames x {} bins",
            signal.len(),
            num_frames,
            num_bins
        );

        let frames = (0..num_frames)
            .into_par_iter()
            .map_init(
                || {
                    (
                        vec![Complex::new(0.0f32, 0.0); self.frame_size],
                        vec![Complex::new(0.0f32, 0.0); scratch_len],
                    )
                },
                |(buffer, scratch), frame_idx| {
                    let start = frame_idx * self.hop_size;
                    for (i, slot) in buffer.iter_mut().enumerate() {
                        let sample = signal.get(start + i).copied().unwrap_or(0.0);
                        *slot = Complex::new(sample * self.window[i], 0.0);
                    }

                    self.fft.process_with_scratch(buffer, scratch);

                    buffer[..num_bins]
                        .iter()
                        .map(|c| Magnitude::new(c.re.hypot(c.im)))
                        .collect::<Vec<_>>()
                },
            )
            .collect();

        StftMatrix {
            frame_size: self.frame_size,
            hop_size: self.hop_size,
            frames,
        }
    }
}
