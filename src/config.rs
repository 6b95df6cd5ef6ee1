use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::loudness::DEFAULT_SEARCH_WIDTH;
use crate::audio::pipeline::{
    PipelineParams, DEFAULT_FRAME_SIZE, DEFAULT_MIN_FREQ, DEFAULT_NUM_BANDS,
};
use crate::audio::spacing::SpacingKind;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    #[serde(default = "default_num_bands")]
    pub num_bands: usize,
    #[serde(default = "default_min_freq")]
    pub min_freq: f32,
    #[serde(default)]
    pub spacing: SpacingKind,
    #[serde(default = "default_search_width")]
    pub search_width: usize,
    #[serde(default)]
    pub include_stft: bool,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub pretty: bool,
    #[serde(default = "default_height_scale")]
    pub height_scale: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            num_bands: default_num_bands(),
            min_freq: default_min_freq(),
            spacing: SpacingKind::default(),
            search_width: default_search_width(),
            include_stft: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            height_scale: default_height_scale(),
        }
    }
}

impl AnalysisConfig {
    pub fn to_params(&self) -> PipelineParams {
        PipelineParams {
            frame_size: self.frame_size,
            num_bands: self.num_bands,
            min_freq: self.min_freq,
            spacing: self.spacing,
            search_width: self.search_width,
            include_stft: self.include_stft,
        }
    }
}

fn default_frame_size() -> usize { DEFAULT_FRAME_SIZE }
fn default_num_bands() -> usize { DEFAULT_NUM_BANDS }
fn default_min_freq() -> f32 { DEFAULT_MIN_FREQ }
fn default_search_width() -> usize { DEFAULT_SEARCH_WIDTH }
fn default_height_scale() -> f32 { 50.0 }

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Invalid config")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// `bandscope.toml` in the working directory, then `~/.config/bandscope`,
/// then the platform config directory.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("bandscope.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("bandscope").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("bandscope").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
