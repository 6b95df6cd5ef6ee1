pub mod bands;
pub mod decode;
pub mod loudness;
pub mod pipeline;
pub mod spacing;
pub mod stft;
pub mod units;
pub mod window;
pub mod worker;
