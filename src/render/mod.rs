//! Rasterization and the frame-by-frame render job.

/// Backend seam: frame plans in, RGBA frames out.
pub mod backend;
/// CPU backend powered by `vello_cpu`.
pub mod cpu;
/// Render job orchestration.
pub mod pipeline;
