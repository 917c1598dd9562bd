pub mod clip;
pub mod mix;
pub mod synth;
