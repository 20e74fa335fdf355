//! Animation primitives driven by the frame loop: easing curves, a
//! sequential tween timeline, repeating timers and frame-time statistics.
//!
//! Nothing here reads a clock. Every type advances only by the deltas the
//! owner passes in, so behavior is reproducible in tests.
//!
//! # Invariants
//! - Timeline steps never overlap: each starts when the previous one ends,
//!   or at the playhead if the timeline was idle.
//! - A cancelled timer never fires again.

mod ease;
mod frame_timer;
mod timeline;
mod timer;

pub use ease::Ease;
pub use frame_timer::FrameTimer;
pub use timeline::{Property, Step, Timeline};
pub use timer::{TimerHandle, TimerSet};
