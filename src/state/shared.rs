// src/state/shared.rs
//
// Lock-free cells shared by the two handles of the bridge.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use crate::sequencer::ActiveVoiceSet;

use super::{ControlReadback, MelodicSnapshot, TransportReadback};

/// Single-writer atomics.
///
/// Gesture side writes: drums, crossfader, melodic voice.
/// Audio side writes: step, progress, sample position, running, bpm,
/// last fired set.
#[derive(Debug)]
pub struct SharedState {
    // Gesture side
    active_drums: AtomicU8,
    /// f32 bits
    crossfader: AtomicU32,
    melodic_active: AtomicBool,
    melodic_generation: AtomicU32,
    melodic_root: AtomicU8,
    /// f32 bits
    melodic_velocity: AtomicU32,

    // Audio side
    step: AtomicU8,
    /// f64 bits (no AtomicF64 in std)
    step_progress: AtomicU64,
    sample_position: AtomicU64,
    running: AtomicBool,
    /// f64 bits
    bpm: AtomicU64,
    fired: AtomicU8,
}

impl SharedState {
    pub fn new(bpm: f64, default_velocity: f32) -> Self {
        Self {
            active_drums: AtomicU8::new(0),
            crossfader: AtomicU32::new(0.5_f32.to_bits()),
            melodic_active: AtomicBool::new(false),
            melodic_generation: AtomicU32::new(0),
            melodic_root: AtomicU8::new(0),
            melodic_velocity: AtomicU32::new(default_velocity.to_bits()),
            step: AtomicU8::new(0),
            step_progress: AtomicU64::new(0.0_f64.to_bits()),
            sample_position: AtomicU64::new(0),
            running: AtomicBool::new(false),
            bpm: AtomicU64::new(bpm.to_bits()),
            fired: AtomicU8::new(0),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Gesture side writers
    // ───────────────────────────────────────────────────────────────

    pub fn set_active_drums(&self, set: ActiveVoiceSet) {
        self.active_drums.store(set.bits(), Ordering::Release);
    }

    pub fn set_crossfader(&self, position: f32) {
        self.crossfader.store(position.to_bits(), Ordering::Relaxed);
    }

    /// Publish a new melodic voice. Root and velocity land before the
    /// generation bump, so a reader that sees the new generation also
    /// sees its root.
    pub fn start_melodic(&self, root: u8, velocity: f32) {
        self.melodic_root.store(root, Ordering::Relaxed);
        self.melodic_velocity.store(velocity.to_bits(), Ordering::Relaxed);
        self.melodic_generation.fetch_add(1, Ordering::Release);
        self.melodic_active.store(true, Ordering::Release);
    }

    pub fn retarget_melodic(&self, root: u8) {
        self.melodic_root.store(root, Ordering::Release);
    }

    pub fn set_melodic_velocity(&self, velocity: f32) {
        self.melodic_velocity.store(velocity.to_bits(), Ordering::Relaxed);
    }

    pub fn stop_melodic(&self, default_velocity: f32) {
        self.melodic_active.store(false, Ordering::Release);
        self.melodic_velocity.store(default_velocity.to_bits(), Ordering::Relaxed);
    }

    // ───────────────────────────────────────────────────────────────
    // Audio side writers
    // ───────────────────────────────────────────────────────────────

    pub fn publish_transport(&self, step: usize, progress: f64, sample_position: u64, running: bool) {
        self.step.store(step as u8, Ordering::Relaxed);
        self.step_progress.store(progress.to_bits(), Ordering::Relaxed);
        self.sample_position.store(sample_position, Ordering::Relaxed);
        self.running.store(running, Ordering::Relaxed);
    }

    pub fn set_bpm(&self, bpm: f64) {
        self.bpm.store(bpm.to_bits(), Ordering::Relaxed);
    }

    pub fn set_fired(&self, fired: ActiveVoiceSet) {
        self.fired.store(fired.bits(), Ordering::Relaxed);
    }

    // ───────────────────────────────────────────────────────────────
    // Readers
    // ───────────────────────────────────────────────────────────────

    pub fn active_drums(&self) -> ActiveVoiceSet {
        ActiveVoiceSet::from_bits(self.active_drums.load(Ordering::Acquire))
    }

    pub fn crossfader(&self) -> f32 {
        f32::from_bits(self.crossfader.load(Ordering::Relaxed))
    }

    pub fn melodic(&self) -> MelodicSnapshot {
        let active = self.melodic_active.load(Ordering::Acquire);
        let generation = self.melodic_generation.load(Ordering::Acquire);
        MelodicSnapshot {
            active,
            generation,
            root: self.melodic_root.load(Ordering::Acquire),
            velocity: f32::from_bits(self.melodic_velocity.load(Ordering::Relaxed)),
        }
    }

    pub fn transport(&self) -> TransportReadback {
        TransportReadback {
            step: self.step.load(Ordering::Relaxed) as usize,
            step_progress: f64::from_bits(self.step_progress.load(Ordering::Relaxed)),
            sample_position: self.sample_position.load(Ordering::Relaxed),
            running: self.running.load(Ordering::Relaxed),
            bpm: f64::from_bits(self.bpm.load(Ordering::Relaxed)),
            fired: ActiveVoiceSet::from_bits(self.fired.load(Ordering::Relaxed)),
        }
    }

    pub fn controls(&self) -> ControlReadback {
        ControlReadback {
            active_drums: self.active_drums(),
            crossfader: self.crossfader(),
            melodic: self.melodic(),
        }
    }
}
