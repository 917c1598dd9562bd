//! Global replay clock and the frame instants sampled from it.

pub mod builder;
pub mod sampler;
