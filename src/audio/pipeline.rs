use serde::Serialize;

use super::bands::BandLayout;
use super::loudness::{self, DEFAULT_SEARCH_WIDTH};
use super::spacing::{Spacing, SpacingKind};
use super::stft::Stft;
use super::units::{Decibel, Magnitude};
use crate::error::{AnalysisError, Result};

pub const DEFAULT_FRAME_SIZE: usize = 1 << 12;
pub const DEFAULT_NUM_BANDS: usize = 128;
pub const DEFAULT_MIN_FREQ: f32 = 20.0;

/// Fixed settings of one pipeline instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    pub frame_size: usize,
    pub num_bands: usize,
    pub min_freq: f32,
    pub spacing: SpacingKind,
    pub search_width: usize,
    /// Keep the raw magnitude spectrogram in the result.
    pub include_stft: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            num_bands: DEFAULT_NUM_BANDS,
            min_freq: DEFAULT_MIN_FREQ,
            spacing: SpacingKind::Mel,
            search_width: DEFAULT_SEARCH_WIDTH,
            include_stft: false,
        }
    }
}

impl PipelineParams {
    /// Frames overlap by three quarters.
    pub fn hop_size(&self) -> usize {
        self.frame_size / 4
    }
}

/// Which loudness reference a bar height is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ceiling {
    Global,
    Local,
}

/// Everything a visualizer needs to animate one track.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub sample_rate: u32,
    pub frame_size: usize,
    pub hop_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stft: Option<Vec<Vec<Magnitude>>>,
    /// `frequency_bands[frame][band]`
    pub frequency_bands: Vec<Vec<Decibel>>,
    #[serde(rename = "globalMaxDB")]
    pub global_max_db: Decibel,
    #[serde(rename = "localMaxes")]
    pub local_max_db: Vec<Decibel>,
    pub spacings: Vec<Spacing>,
}

impl AnalysisResult {
    pub fn num_frames(&self) -> usize {
        self.frequency_bands.len()
    }

    pub fn num_bands(&self) -> usize {
        self.spacings.len()
    }

    /// Playback time covered by one frame advance.
    pub fn seconds_per_frame(&self) -> f32 {
        self.hop_size as f32 / self.sample_rate as f32
    }

    /// Frame index at `seconds` and the fraction of the way to the next one.
    /// Clamped to the last frame.
    pub fn frame_position(&self, seconds: f32) -> (usize, f32) {
        let last = self.num_frames().saturating_sub(1);
        let exact = (seconds.max(0.0) / self.seconds_per_frame()).max(0.0);
        let frame = exact.floor() as usize;
        if frame >= last {
            (last, 0.0)
        } else {
            (frame, exact - frame as f32)
        }
    }

    /// Level of `band` at playback time `seconds`, interpolated between frames.
    pub fn band_db_at(&self, seconds: f32, band: usize) -> Option<Decibel> {
        let (frame, t) = self.frame_position(seconds);
        let current = *self.frequency_bands.get(frame)?.get(band)?;
        match self.frequency_bands.get(frame + 1).and_then(|row| row.get(band)) {
            Some(&next) => Some(current.lerp(next, t)),
            None => Some(current),
        }
    }

    /// Emphasised bar height of one cell, in `[0, scale]`.
    pub fn band_height(&self, frame: usize, band: usize, ceiling: Ceiling, scale: f32) -> f32 {
        let Some(&db) = self.frequency_bands.get(frame).and_then(|row| row.get(band)) else {
            return 0.0;
        };
        let reference = match ceiling {
            Ceiling::Global => self.global_max_db,
            Ceiling::Local => self
                .local_max_db
                .get(frame)
                .copied()
                .unwrap_or(self.global_max_db),
        };
        loudness::db_to_height(db, reference, scale)
    }

    /// Peak level reached by each band over the whole analysis.
    pub fn band_peaks(&self) -> Vec<Decibel> {
        let mut peaks = vec![Decibel::default(); self.num_bands()];
        for row in &self.frequency_bands {
            for (peak, &db) in peaks.iter_mut().zip(row) {
                *peak = peak.max(db);
            }
        }
        peaks
    }
}

/// Runs the full analysis synchronously on the calling thread.
pub fn analyze(
    samples: &[f32],
    sample_rate: u32,
    params: &PipelineParams,
) -> Result<AnalysisResult> {
    if sample_rate == 0 {
        return Err(AnalysisError::invalid("sample rate must be positive"));
    }
    if params.hop_size() == 0 {
        return Err(AnalysisError::invalid(format!(
            "frame size must be at least 4 so the hop (frame_size / 4) is positive, got {}",
            params.frame_size
        )));
    }
    let nyquist = sample_rate as f32 / 2.0;

    let stft = Stft::new(params.frame_size, params.hop_size())?;
    let spacings = params.spacing.spacings(params.min_freq, nyquist, params.num_bands)?;

    log::info!(
        "Pass 1: STFT ({} samples @ {}Hz, frame={}, hop={})...",
        samples.len(),
        sample_rate,
        stft.frame_size(),
        stft.hop_size()
    );
    let spectrum = stft.magnitudes(samples);

    log::info!(
        "Pass 2: Grouping {} bins into {} {:?} bands...",
        spectrum.num_bins(),
        spacings.len(),
        params.spacing
    );
    let layout = BandLayout::new(&spacings, sample_rate, spectrum.num_bins())?;
    let band_magnitudes = layout.aggregate(&spectrum);
    let frequency_bands = loudness::to_db_matrix(&band_magnitudes);

    log::info!("Pass 3: Loudness references (search width={})...", params.search_width);
    let global_max_db = loudness::global_max_db(&frequency_bands);
    let local_max_db = loudness::local_max_db(&frequency_bands, params.search_width);

    log::info!(
        "Analysis: {} frames, {} bands, global max {}",
        frequency_bands.len(),
        spacings.len(),
        global_max_db
    );

    Ok(AnalysisResult {
        sample_rate,
        frame_size: stft.frame_size(),
        hop_size: stft.hop_size(),
        stft: params.include_stft.then_some(spectrum.frames),
        frequency_bands,
        global_max_db,
        local_max_db,
        spacings,
    })
}
