use rayon::prelude::*;

use super::spacing::Spacing;
use super::stft::StftMatrix;
use super::units::Magnitude;
use crate::error::{AnalysisError, Result};

/// Bin ranges for each band, resolved once for a given spectrum shape.
#[derive(Debug, Clone, PartialEq)]
pub struct BandLayout {
    bin_width: f32,
    ranges: Vec<(usize, usize)>,
}

impl BandLayout {
    /// `num_bins` is the one-sided spectrum length (`frame_size / 2 + 1`).
    pub fn new(spacings: &[Spacing], sample_rate: u32, num_bins: usize) -> Result<Self> {
        if num_bins < 2 {
            return Err(AnalysisError::invalid(format!(
                "band layout needs at least two bins, got {num_bins}"
            )));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::invalid("sample rate must be positive"));
        }

        let bin_width = sample_rate as f32 / (2 * (num_bins - 1)) as f32;
        let ranges: Vec<(usize, usize)> = spacings
            .iter()
            .map(|s| {
                let start = bin_index(s.start, bin_width).min(num_bins);
                let end = bin_index(s.end, bin_width).min(num_bins);
                (start, end.max(start))
            })
            .collect();

        let empty = ranges.iter().filter(|(a, b)| a == b).count();
        if empty > 0 {
            log::warn!(
                "{} of {} bands cover no FFT bin (bin width {:.2} Hz); using the magnitude floor",
                empty,
                ranges.len(),
                bin_width
            );
        }

        Ok(BandLayout { bin_width, ranges })
    }

    pub fn bin_width(&self) -> f32 {
        self.bin_width
    }

    pub fn num_bands(&self) -> usize {
        self.ranges.len()
    }

    /// Half-open bin range `[start, end)` of each band.
    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    /// Mean magnitude per band for one spectrum row.
    pub fn aggregate_row(&self, row: &[Magnitude]) -> Vec<Magnitude> {
        self.ranges
            .iter()
            .map(|&(start, end)| {
                let end = end.min(row.len());
                if start >= end {
                    return Magnitude::FLOOR;
                }
                let sum: f32 = row[start..end].iter().map(|m| m.value()).sum();
                Magnitude::new(sum / (end - start) as f32)
            })
            .collect()
    }

    /// Band magnitudes for every frame of the spectrogram.
    pub fn aggregate(&self, stft: &StftMatrix) -> Vec<Vec<Magnitude>> {
        stft.frames
            .par_iter()
            .map(|row| self.aggregate_row(row))
            .collect()
    }
}

fn bin_index(hz: f32, bin_width: f32) -> usize {
    let idx = (hz / bin_width).ceil();
    if idx > 0.0 {
        idx as usize
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::spacing::linear_spacing;

    fn mags(values: &[f32]) -> Vec<Magnitude> {
        values.iter().copied().map(Magnitude::new).collect()
    }

    #[test]
    fn ranges_use_ceiling_indices() {
        // 9 bins over 0..=80 Hz, 10 Hz apart
        let spacings = vec![Spacing::new(0.0, 25.0), Spacing::new(25.0, 80.0)];
        let layout = BandLayout::new(&spacings, 160, 9).unwrap();
        assert_eq!(layout.bin_width(), 10.0);
        assert_eq!(layout.ranges(), &[(0, 3), (3, 8)]);
    }

    #[test]
    fn end_index_is_clamped_to_bin_count() {
        let spacings = vec![Spacing::new(50.0, 1000.0)];
        let layout = BandLayout::new(&spacings, 160, 9).unwrap();
        assert_eq!(layout.ranges(), &[(5, 9)]);
    }

    #[test]
    fn band_value_is_mean_of_bins() {
        let spacings = vec![Spacing::new(0.0, 25.0), Spacing::new(25.0, 80.0)];
        let layout = BandLayout::new(&spacings, 160, 9).unwrap();
        let row = mags(&[1.0, 2.0, 3.0, 4.0, 4.0, 4.0, 4.0, 4.0, 100.0]);
        let bands = layout.aggregate_row(&row);
        assert_eq!(bands, mags(&[2.0, 4.0]));
    }

    #[test]
    fn empty_band_falls_back_to_floor() {
        let spacings = vec![Spacing::new(1.0, 2.0), Spacing::new(2.0, 30.0)];
        let layout = BandLayout::new(&spacings, 160, 9).unwrap();
        assert_eq!(layout.ranges()[0], (1, 1));
        let row = mags(&[0.0, 8.0, 8.0, 8.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let bands = layout.aggregate_row(&row);
        assert_eq!(bands[0], Magnitude::FLOOR);
        assert_eq!(bands[1], Magnitude::new(8.0));
    }

    #[test]
    fn aggregates_every_frame() {
        let spacings = linear_spacing(0.0, 80.0, 4).unwrap();
        let layout = BandLayout::new(&spacings, 160, 9).unwrap();
        let stft = StftMatrix {
            frame_size: 16,
            hop_size: 4,
            frames: vec![mags(&[1.0; 9]), mags(&[0.0; 9]), mags(&[3.0; 9])],
        };
        let bands = layout.aggregate(&stft);
        assert_eq!(bands.len(), 3);
        assert!(bands[0].iter().all(|&m| m == Magnitude::new(1.0)));
        assert!(bands[1].iter().all(|&m| m == Magnitude::new(0.0)));
        assert!(bands[2].iter().all(|&m| m == Magnitude::new(3.0)));
    }

    #[test]
    fn rejects_degenerate_shapes() {
        let spacings = vec![Spacing::new(0.0, 10.0)];
        assert!(BandLayout::new(&spacings, 160, 1).is_err());
        assert!(BandLayout::new(&spacings, 0, 9).is_err());
    }
}
