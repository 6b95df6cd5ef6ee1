use std::f32::consts::PI;

/// Raised-sine (periodic Hann) coefficient for sample `n` of a frame.
pub fn hann(n: usize, frame_size: usize) -> f32 {
    let s = (PI * n as f32 / frame_size as f32).sin();
    s * s
}

/// Full window table for one frame size.
pub fn hann_window(frame_size: usize) -> Vec<f32> {
    (0..frame_size).map(|i| hann(i, frame_size)).collect()
}
