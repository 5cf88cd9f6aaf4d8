//! Controller layer: store-to-renderer events, rendering, and action scripts.

pub mod events;
pub mod orchestration;
pub mod render;
