//! End-to-end checks of the public analysis API at the default pipeline
//! settings (frame 4096, hop 1024, 128 mel bands).

use std::f32::consts::PI;

use bandscope::audio::loudness::db_to_height;
use bandscope::audio::stft::frame_count;
use bandscope::audio::worker::analyze_in_background;
use bandscope::{analyze, AnalysisResult, Ceiling, PipelineParams, SpacingKind, MIN_DB};

const SAMPLE_RATE: u32 = 44100;

fn sine(freq: f32, seconds: f32) -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * seconds) as usize;
    (0..n)
        .map(|i| (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

fn band_containing(result: &AnalysisResult, hz: f32) -> usize {
    result
        .spacings
        .iter()
        .position(|s| s.start <= hz && hz < s.end)
        .expect("frequency inside analysed range")
}

#[test]
fn tone_band_stands_out_from_treble() {
    let result = analyze(&sine(440.0, 1.0), SAMPLE_RATE, &PipelineParams::default()).unwrap();

    assert_eq!(result.frame_size, 4096);
    assert_eq!(result.hop_size, 1024);
    assert_eq!(result.num_bands(), 128);
    assert_eq!(result.num_frames(), frame_count(44100, 4096, 1024));

    let tone = band_containing(&result, 440.0);
    let treble = band_containing(&result, 10000.0);
    for (f, row) in result.frequency_bands.iter().enumerate().skip(1) {
        let gap = row[tone].value() - row[treble].value();
        assert!(gap > 20.0, "frame {f}: only {gap:.1} dB between 440 Hz and 10 kHz");
    }
}

#[test]
fn tone_sets_both_loudness_references() {
    let result = analyze(&sine(440.0, 1.0), SAMPLE_RATE, &PipelineParams::default()).unwrap();
    let tone = band_containing(&result, 440.0);

    let loudest = result
        .frequency_bands
        .iter()
        .map(|row| row[tone])
        .fold(MIN_DB, |a, b| a.max(b));
    assert!(loudest.value() > 40.0, "tone band peaked at {loudest}");
    assert!(result.global_max_db >= loudest);
    assert_eq!(result.local_max_db.len(), result.num_frames());
    for local in &result.local_max_db {
        assert!(*local <= result.global_max_db);
        assert!(*local > MIN_DB);
    }
}

#[test]
fn silence_stays_on_the_floor() {
    for len in [0usize, 1000, 4096, 10_000, 44_100] {
        let result = analyze(&vec![0.0; len], SAMPLE_RATE, &PipelineParams::default()).unwrap();
        assert_eq!(result.num_frames(), frame_count(len, 4096, 1024));
        assert!(result.frequency_bands.iter().flatten().all(|&db| db == MIN_DB));
        assert_eq!(result.global_max_db, MIN_DB);
        assert!(result.local_max_db.iter().all(|&db| db == MIN_DB));

        for frame in 0..result.num_frames() {
            for band in 0..result.num_bands() {
                assert_eq!(result.band_height(frame, band, Ceiling::Global, 50.0), 0.0);
                assert_eq!(result.band_height(frame, band, Ceiling::Local, 50.0), 0.0);
            }
        }
    }
}

#[test]
fn output_is_always_finite() {
    let mut noisy = sine(3000.0, 0.5);
    noisy.extend(vec![0.0; 8000]);
    noisy.extend(sine(60.0, 0.25).iter().map(|s| s * 1e-6));

    for spacing in [
        SpacingKind::Linear,
        SpacingKind::Logistic,
        SpacingKind::LogisticInverted,
        SpacingKind::Mel,
    ] {
        let params = PipelineParams {
            spacing,
            ..PipelineParams::default()
        };
        let result = analyze(&noisy, SAMPLE_RATE, &params).unwrap();
        for &db in result.frequency_bands.iter().flatten() {
            assert!(db.value().is_finite());
            assert!(db >= MIN_DB);
            let h = db_to_height(db, result.global_max_db, 50.0);
            assert!((0.0..=50.0).contains(&h));
        }
    }
}

#[test]
fn background_analysis_matches_direct_call() {
    let signal = sine(1000.0, 0.5);
    let direct = analyze(&signal, SAMPLE_RATE, &PipelineParams::default()).unwrap();
    let threaded = analyze_in_background(signal, SAMPLE_RATE, PipelineParams::default()).unwrap();

    assert_eq!(direct.frequency_bands, threaded.frequency_bands);
    assert_eq!(direct.global_max_db, threaded.global_max_db);
    assert_eq!(direct.local_max_db, threaded.local_max_db);
}

#[test]
fn playback_clock_follows_hop() {
    let result = analyze(&sine(440.0, 1.0), SAMPLE_RATE, &PipelineParams::default()).unwrap();
    let per_frame = result.seconds_per_frame();
    assert!((per_frame - 1024.0 / 44100.0).abs() < 1e-7);

    let (frame, t) = result.frame_position(per_frame * 3.5);
    assert_eq!(frame, 3);
    assert!((t - 0.5).abs() < 1e-3);
}
