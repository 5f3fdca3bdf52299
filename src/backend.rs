//! Seams to the external audio engine.
//!
//! The gesture side talks to a [`SynthBackend`]; the audio side fires
//! one-shots and arpeggio notes through a [`StepSink`]. Neither trait says
//! anything about how sound is produced.
//!
//! [`CommandQueue`] implements both by recording [`AudioCommand`]s. The
//! browser bindings drain it as JSON and hand it to the JavaScript audio
//! graph; tests inspect it directly.

use serde::Serialize;

use crate::arpeggio::Arpeggio;
use crate::effects::{EffectKind, EffectState};
use crate::error::{BackendError, BackendResult};
use crate::presets::SynthPreset;
use crate::sequencer::DrumVoice;

/// Gesture-side control surface of the synth.
///
/// Only the voice lifecycle manager calls the voice methods.
pub trait SynthBackend {
    /// False until the audio context is running.
    fn is_ready(&self) -> bool;

    fn start_voice(&mut self, slot: usize, arpeggio: &Arpeggio, velocity: f32) -> BackendResult<()>;

    fn retarget_voice(&mut self, slot: usize, arpeggio: &Arpeggio);

    fn set_voice_velocity(&mut self, slot: usize, velocity: f32);

    /// Must be safe to call for a slot with no voice.
    fn stop_voice(&mut self, slot: usize);

    fn apply_preset(&mut self, index: usize, preset: &SynthPreset);

    fn set_crossfader(&mut self, position: f32);

    fn set_effect(&mut self, kind: EffectKind, state: EffectState);
}

/// Audio-side trigger surface, called with scheduled times in seconds.
pub trait StepSink {
    fn trigger_percussion(&mut self, voice: DrumVoice, time: f64);

    fn trigger_note(&mut self, slot: usize, note: u8, velocity: f32, time: f64);
}

// ═══════════════════════════════════════════════════════════════════
// Recorded commands
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioCommand {
    StartVoice {
        slot: usize,
        root: u8,
        notes: Vec<u8>,
        velocity: f32,
    },
    RetargetVoice {
        slot: usize,
        root: u8,
        notes: Vec<u8>,
    },
    SetVelocity {
        slot: usize,
        velocity: f32,
    },
    StopVoice {
        slot: usize,
    },
    ApplyPreset {
        index: usize,
        preset: SynthPreset,
    },
    SetCrossfader {
        position: f32,
    },
    SetEffect {
        effect: EffectKind,
        active: bool,
        intensity: f32,
    },
    Percussion {
        voice: DrumVoice,
        time: f64,
    },
    Note {
        slot: usize,
        note: u8,
        velocity: f32,
        time: f64,
    },
}

/// Backend that records every call.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<AudioCommand>,
    ready: bool,
    reject_starts: bool,
}

impl CommandQueue {
    /// A queue that reports not ready until [`set_ready`](Self::set_ready).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Make every subsequent `start_voice` fail.
    pub fn reject_starts(&mut self, reject: bool) {
        self.reject_starts = reject;
    }

    pub fn commands(&self) -> &[AudioCommand] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Serialize and clear pending commands.
    pub fn drain_json(&mut self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(&self.commands)?;
        self.commands.clear();
        Ok(json)
    }

    fn count(&self, pred: impl Fn(&AudioCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn start_count(&self) -> usize {
        self.count(|c| matches!(c, AudioCommand::StartVoice { .. }))
    }

    pub fn stop_count(&self) -> usize {
        self.count(|c| matches!(c, AudioCommand::StopVoice { .. }))
    }

    pub fn retarget_count(&self) -> usize {
        self.count(|c| matches!(c, AudioCommand::RetargetVoice { .. }))
    }

    pub fn preset_count(&self) -> usize {
        self.count(|c| matches!(c, AudioCommand::ApplyPreset { .. }))
    }

    pub fn percussion_count(&self) -> usize {
        self.count(|c| matches!(c, AudioCommand::Percussion { .. }))
    }

    pub fn note_count(&self) -> usize {
        self.count(|c| matches!(c, AudioCommand::Note { .. }))
    }
}

impl SynthBackend for CommandQueue {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn start_voice(&mut self, slot: usize, arpeggio: &Arpeggio, velocity: f32) -> BackendResult<()> {
        if !self.ready {
            return Err(BackendError::NotReady);
        }
        if self.reject_starts {
            return Err(BackendError::Rejected(format!("voice for slot {}", slot)));
        }
        self.commands.push(AudioCommand::StartVoice {
            slot,
            root: arpeggio.root(),
            notes: arpeggio.notes().to_vec(),
            velocity,
        });
        Ok(())
    }

    fn retarget_voice(&mut self, slot: usize, arpeggio: &Arpeggio) {
        self.commands.push(AudioCommand::RetargetVoice {
            slot,
            root: arpeggio.root(),
            notes: arpeggio.notes().to_vec(),
        });
    }

    fn set_voice_velocity(&mut self, slot: usize, velocity: f32) {
        self.commands.push(AudioCommand::SetVelocity { slot, velocity });
    }

    fn stop_voice(&mut self, slot: usize) {
        self.commands.push(AudioCommand::StopVoice { slot });
    }

    fn apply_preset(&mut self, index: usize, preset: &SynthPreset) {
        self.commands.push(AudioCommand::ApplyPreset {
            index,
            preset: preset.clone(),
        });
    }

    fn set_crossfader(&mut self, position: f32) {
        self.commands.push(AudioCommand::SetCrossfader { position });
    }

    fn set_effect(&mut self, kind: EffectKind, state: EffectState) {
        self.commands.push(AudioCommand::SetEffect {
            effect: kind,
            active: state.active,
            intensity: state.intensity,
        });
    }
}

impl StepSink for CommandQueue {
    fn trigger_percussion(&mut self, voice: DrumVoice, time: f64) {
        self.commands.push(AudioCommand::Percussion { voice, time });
    }

    fn trigger_note(&mut self, slot: usize, note: u8, velocity: f32, time: f64) {
        self.commands.push(AudioCommand::Note {
            slot,
            note,
            velocity,
            time,
        });
    }
}
