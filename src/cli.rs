use clap::Parser;
use std::path::PathBuf;

use bandscope::SpacingKind;

#[derive(Parser, Debug)]
#[command(name = "bandscope", about = "Perceptual band analysis of audio files for visualizers")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Write the analysis JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to bandscope.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Band spacing strategy
    #[arg(long, value_enum)]
    pub spacing: Option<SpacingKind>,

    /// Number of frequency bands
    #[arg(long)]
    pub bands: Option<usize>,

    /// STFT frame size (power of two); the hop is a quarter of it
    #[arg(long)]
    pub frame_size: Option<usize>,

    /// Lowest band edge in Hz
    #[arg(long)]
    pub min_freq: Option<f32>,

    /// Frames spanned by the local loudness maximum
    #[arg(long)]
    pub search_width: Option<usize>,

    /// Include the raw magnitude spectrogram in the output
    #[arg(long)]
    pub include_stft: bool,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,

    /// Print per-band peaks instead of the full analysis
    #[arg(long)]
    pub summary: bool,
}
