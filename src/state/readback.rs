// src/state/readback.rs
//
// Plain snapshots of the shared cells, cheap to copy and hand to a UI.

use crate::sequencer::ActiveVoiceSet;

/// Melodic voice as published by the gesture side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MelodicSnapshot {
    pub active: bool,
    /// Bumped on every voice start; a new value restarts the pattern.
    pub generation: u32,
    pub root: u8,
    pub velocity: f32,
}

/// Sequencer state for beat indicators.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransportReadback {
    /// Current step, 0..16.
    pub step: usize,
    /// Fraction of the current step elapsed.
    pub step_progress: f64,
    pub sample_position: u64,
    pub running: bool,
    pub bpm: f64,
    /// Voices fired on the most recent step.
    pub fired: ActiveVoiceSet,
}

/// Gesture-side controls as the audio side sees them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlReadback {
    pub active_drums: ActiveVoiceSet,
    pub crossfader: f32,
    pub melodic: MelodicSnapshot,
}
