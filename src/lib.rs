//! Deferred, layer-ordered rendering core for a 2D side-scrolling
//! platformer.
//!
//! Draw calls are queued during the frame, sorted by layer at flush
//! time, and dispatched to a pluggable backend: hardware OpenGL (behind
//! the `opengl` feature) or a pure-software blitter. A quarter-resolution
//! lightmap pass supports dynamic lighting with an ambient-darkness
//! short circuit.

pub mod config;
pub mod error;
pub mod math;
pub mod video;

pub use config::VideoOptions;
pub use error::{VideoError, VideoResult};
pub use video::VideoSystem;
