//! Decibel conversion and the loudness references used to scale bars.

use rayon::prelude::*;

use super::units::{Decibel, Magnitude, MIN_DB};

/// Width in frames of the local-maximum search window.
pub const DEFAULT_SEARCH_WIDTH: usize = 50;

/// Exponent of the perceptual emphasis applied to normalized levels.
const EMPHASIS: i32 = 5;

pub fn to_db_matrix(magnitudes: &[Vec<Magnitude>]) -> Vec<Vec<Decibel>> {
    magnitudes
        .par_iter()
        .map(|row| row.iter().map(|m| m.to_db()).collect())
        .collect()
}

/// Loudest cell of a single frame, `MIN_DB` for an empty row.
pub fn frame_max_db(row: &[Decibel]) -> Decibel {
    row.iter().copied().fold(MIN_DB, Decibel::max)
}

/// Loudest cell of the whole matrix.
pub fn global_max_db(matrix: &[Vec<Decibel>]) -> Decibel {
    matrix
        .iter()
        .map(|row| frame_max_db(row))
        .fold(MIN_DB, Decibel::max)
}

/// Per-frame loudest cell within `search_width / 2` frames either side,
/// clamped at the edges of the analysis.
pub fn local_max_db(matrix: &[Vec<Decibel>], search_width: usize) -> Vec<Decibel> {
    let frame_peaks: Vec<Decibel> = matrix.iter().map(|row| frame_max_db(row)).collect();
    let half = search_width / 2;

    (0..frame_peaks.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(frame_peaks.len());
            frame_peaks[start..end]
                .iter()
                .copied()
                .fold(MIN_DB, Decibel::max)
        })
        .collect()
}

/// Position of `db` between the floor and `ceiling`, in `[0, 1]`.
/// A ceiling at or below the floor (silent input) maps everything to 0.
pub fn normalize(db: Decibel, ceiling: Decibel) -> f32 {
    let range = ceiling.value() - MIN_DB.value();
    if range <= 0.0 {
        return 0.0;
    }
    ((db.value() - MIN_DB.value()) / range).clamp(0.0, 1.0)
}

/// Bar height for `db` against `ceiling`, emphasised so quiet content
/// collapses toward zero. Always in `[0, scale]`.
pub fn db_to_height(db: Decibel, ceiling: Decibel, scale: f32) -> f32 {
    normalize(db, ceiling).powi(EMPHASIS) * scale
}
