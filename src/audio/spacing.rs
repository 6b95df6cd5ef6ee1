//! Frequency band boundaries.
//!
//! Every strategy returns exactly `num_groups` adjacent, strictly increasing
//! spacings whose first start and last end are the requested bounds.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::units::{hz_to_mel, mel_to_hz};
use crate::error::{AnalysisError, Result};

/// A frequency range in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spacing {
    pub start: f32,
    pub end: f32,
}

impl Spacing {
    pub fn new(start: f32, end: f32) -> Self {
        Spacing { start, end }
    }

    pub fn contains(&self, hz: f32) -> bool {
        self.start <= hz && hz <= self.end
    }

    pub fn width(&self) -> f32 {
        self.end - self.start
    }
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}]", self.start, self.end)
    }
}

/// Which strategy lays out the bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SpacingKind {
    Linear,
    Logistic,
    LogisticInverted,
    #[default]
    Mel,
}

impl SpacingKind {
    pub fn spacings(self, start: f32, end: f32, num_groups: usize) -> Result<Vec<Spacing>> {
        match self {
            SpacingKind::Linear => linear_spacing(start, end, num_groups),
            SpacingKind::Logistic => logistic_spacing(start, end, num_groups, Direction::Normal),
            SpacingKind::LogisticInverted => {
                logistic_spacing(start, end, num_groups, Direction::Inverted)
            }
            SpacingKind::Mel => mel_spacing(start, end, num_groups),
        }
    }
}

/// Orientation of the geometric progression in [`logistic_spacing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Narrow bands at the low end.
    Normal,
    /// Narrow bands at the high end.
    Inverted,
}

fn check_range(start: f32, end: f32, num_groups: usize) -> Result<()> {
    if num_groups < 1 {
        return Err(AnalysisError::invalid("num_groups must be at least one"));
    }
    if !start.is_finite() || !end.is_finite() {
        return Err(AnalysisError::invalid(format!(
            "spacing bounds must be finite, got [{start}, {end}]"
        )));
    }
    if end <= start {
        return Err(AnalysisError::invalid(format!(
            "spacing end ({end}) must exceed start ({start})"
        )));
    }
    Ok(())
}

/// Pairs consecutive boundary points, pinning the outer edges to the exact bounds.
///
/// A range too narrow for `f32` to hold every boundary collapses some of
/// them onto each other; that is rejected rather than returned as empty bands.
fn from_points(mut points: Vec<f32>, start: f32, end: f32) -> Result<Vec<Spacing>> {
    if let Some(first) = points.first_mut() {
        *first = start;
    }
    if let Some(last) = points.last_mut() {
        *last = end;
    }
    if let Some(pair) = points.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(AnalysisError::invalid(format!(
            "[{start}, {end}] is too narrow for {} bands (boundary {} does not exceed {})",
            points.len() - 1,
            pair[1],
            pair[0]
        )));
    }
    Ok(points
        .windows(2)
        .map(|pair| Spacing::new(pair[0], pair[1]))
        .collect())
}

pub fn linear_spacing(start: f32, end: f32, num_groups: usize) -> Result<Vec<Spacing>> {
    check_range(start, end, num_groups)?;

    let width = (end - start) / num_groups as f32;
    let points = (0..=num_groups)
        .map(|i| start + width * i as f32)
        .collect();
    from_points(points, start, end)
}

/// Geometric progression `start * (end / start)^(i / num_groups)`.
pub fn logistic_spacing(
    start: f32,
    end: f32,
    num_groups: usize,
    direction: Direction,
) -> Result<Vec<Spacing>> {
    if num_groups < 1 {
        return Err(AnalysisError::invalid("num_groups must be at least one"));
    }
    if start.is_nan() || start < 1.0 {
        return Err(AnalysisError::invalid("start must be a positive number"));
    }
    if end.is_nan() || end < 1.0 {
        return Err(AnalysisError::invalid("end must be a positive number"));
    }
    check_range(start, end, num_groups)?;

    let ratio = end / start;
    let points = (0..=num_groups)
        .map(|i| {
            let t = i as f32 / num_groups as f32;
            match direction {
                Direction::Normal => start * ratio.powf(t),
                Direction::Inverted => end - start * ratio.powf(1.0 - t) + start,
            }
        })
        .collect();
    from_points(points, start, end)
}

/// Equal-width bands on the mel scale, mapped back to Hz.
pub fn mel_spacing(start: f32, end: f32, num_groups: usize) -> Result<Vec<Spacing>> {
    check_range(start, end, num_groups)?;
    if start < 0.0 {
        return Err(AnalysisError::invalid(format!(
            "mel spacing needs a non-negative start, got {start}"
        )));
    }

    let mel_start = hz_to_mel(start);
    let mel_end = hz_to_mel(end);
    let step = (mel_end - mel_start) / num_groups as f32;
    let points = (0..=num_groups)
        .map(|i| mel_to_hz(mel_start + step * i as f32))
        .collect();
    from_points(points, start, end)
}
