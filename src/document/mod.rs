//! Recording document: boundary JSON model and the trusted replay model.

pub mod model;
pub mod normalize;
