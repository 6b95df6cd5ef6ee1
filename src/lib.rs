//! Offline spectral analysis for audio visualizers.
//!
//! A mono signal goes through a windowed STFT, is grouped into perceptual
//! frequency bands, converted to decibels and annotated with global and
//! sliding-window loudness peaks. [`audio::worker::AnalysisWorker`] runs the
//! whole thing on a background thread.

pub mod audio;
pub mod config;
pub mod error;

pub use audio::pipeline::{analyze, AnalysisResult, Ceiling, PipelineParams};
pub use audio::spacing::{Spacing, SpacingKind};
pub use audio::units::{Decibel, Magnitude, MIN_DB, MIN_MAGNITUDE};
pub use audio::worker::{AnalysisRequest, AnalysisWorker};
pub use error::{AnalysisError, Result};
