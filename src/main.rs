mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

use bandscope::audio::decode::decode_audio;
use bandscope::audio::loudness::db_to_height;
use bandscope::config::{self, Config};
use bandscope::{AnalysisRequest, AnalysisResult, AnalysisWorker, PipelineParams};
use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(config::find_config);
    let cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            // an explicit --config must load; a discovered one may be skipped
            Err(err) if cli.config.is_some() => return Err(err),
            Err(err) => {
                log::warn!("{:#}", err);
                Config::default()
            }
        },
        None => Config::default(),
    };

    let params = resolve_params(&cli, &cfg);
    let pretty = cli.pretty || cfg.output.pretty;

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("bandscope - perceptual band analysis");
    log::info!("Input: {}", cli.input.display());
    log::info!(
        "Bands: {} {:?}, frame {} / hop {}, from {} Hz",
        params.num_bands,
        params.spacing,
        params.frame_size,
        params.hop_size(),
        params.min_freq
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio = decode_audio(&cli.input)?;

    // 2. Analyze on the worker thread; this thread only keeps the spinner going
    let mut worker = AnalysisWorker::spawn(params).context("Failed to start analysis thread")?;
    worker.submit(AnalysisRequest {
        samples: audio.samples,
        sample_rate: audio.sample_rate,
    })?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {spinner} {msg}")?
            .tick_chars("|/-\\ "),
    );
    spinner.set_message("Analyzing audio...");

    let reply = loop {
        if let Some(reply) = worker.recv_timeout(Duration::from_millis(80)) {
            break reply;
        }
        spinner.tick();
    };
    spinner.finish_and_clear();
    worker.shutdown();

    let analysis = reply.context("Analysis failed")?;
    log::info!(
        "Analyzed {} frames x {} bands ({:.1} ms per frame), global max {}",
        analysis.num_frames(),
        analysis.num_bands(),
        analysis.seconds_per_frame() * 1000.0,
        analysis.global_max_db
    );

    // 3. Emit
    let rendered = if cli.summary {
        render_summary(&analysis, cfg.output.height_scale)
    } else if pretty {
        serde_json::to_string_pretty(&analysis)?
    } else {
        serde_json::to_string(&analysis)?
    };

    match cli.output {
        Some(ref path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            log::info!("Done! Output: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

/// CLI flags win over the config file, which wins over built-in defaults.
fn resolve_params(cli: &Cli, cfg: &Config) -> PipelineParams {
    let mut params = cfg.analysis.to_params();
    if let Some(spacing) = cli.spacing {
        params.spacing = spacing;
    }
    if let Some(bands) = cli.bands {
        params.num_bands = bands;
    }
    if let Some(frame_size) = cli.frame_size {
        params.frame_size = frame_size;
    }
    if let Some(min_freq) = cli.min_freq {
        params.min_freq = min_freq;
    }
    if let Some(search_width) = cli.search_width {
        params.search_width = search_width;
    }
    params.include_stft |= cli.include_stft;
    params
}

fn render_summary(analysis: &AnalysisResult, height_scale: f32) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "frames: {}  hop: {}  global max: {}\n",
        analysis.num_frames(),
        analysis.hop_size,
        analysis.global_max_db
    ));
    for (i, (spacing, peak)) in analysis
        .spacings
        .iter()
        .zip(analysis.band_peaks())
        .enumerate()
    {
        let height = db_to_height(peak, analysis.global_max_db, height_scale);
        out.push_str(&format!(
            "{:>4} {:>22} {:>10} {:>8.2}\n",
            i,
            spacing.to_string(),
            peak.to_string(),
            height
        ));
    }
    out
}
