// src/voice.rs

use crate::arpeggio::Arpeggio;

pub type SlotId = usize;

/// Lifecycle phase of the melodic voice for one hand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoicePhase {
    /// No hand in the slot.
    #[default]
    Absent,
    /// Hand open, voice sounding.
    Open,
    /// Hand closed, voice torn down.
    Fisted,
}

/// A running arpeggio bound to one hand slot.
///
/// Holds only what the gesture side needs to decide on retargets and
/// volume; the sound itself lives behind the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MelodicVoice {
    pub slot: SlotId,
    pub arpeggio: Arpeggio,
    pub velocity: f32,
}

impl MelodicVoice {
    #[inline]
    pub fn new(slot: SlotId, root: u8, velocity: f32) -> Self {
        Self {
            slot,
            arpeggio: Arpeggio::new(root),
            velocity,
        }
    }

    #[inline]
    pub fn root(&self) -> u8 {
        self.arpeggio.root()
    }
}
