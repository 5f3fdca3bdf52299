// src/state/mod.rs
//
// State shared between the gesture thread and the audio thread.
//
// Key principles:
// - Every shared field has exactly one writer
// - Continuous values live in atomics, read as snapshots
// - Discrete requests go through Commands
// - Neither side ever blocks on the other

mod command;
mod readback;
mod shared;

pub use command::*;
pub use readback::*;
pub use shared::*;
