//! Frame output and video encoding.
//!
//! Sinks consume rendered frames in timeline order; the encoder turns a written frame sequence
//! into a video with the system `ffmpeg`.

/// `ffmpeg` video encoding of PNG sequences.
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
