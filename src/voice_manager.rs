// src/voice_manager.rs

use crate::backend::SynthBackend;
use crate::mapper::MelodicControl;
use crate::presets::PresetBank;
use crate::voice::{MelodicVoice, SlotId, VoicePhase};

/// What one frame changed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LifecycleReport {
    /// Root of a newly started voice.
    pub started: Option<u8>,
    /// New root of a retargeted voice.
    pub retargeted: Option<u8>,
    /// A live voice was torn down.
    pub stopped: bool,
    /// Index of the preset switched to on a fist edge.
    pub preset: Option<usize>,
}

/// Owns the melodic voice of one hand slot.
///
/// Responsibilities:
/// - start, retarget and stop the voice from hand state
/// - cycle presets on the fist rising edge
/// - push velocity every open frame
///
/// Does NOT:
/// - classify gestures
/// - schedule notes (the sequencer steps the arpeggio)
pub struct VoiceLifecycle {
    slot: SlotId,
    voice: Option<MelodicVoice>,
    phase: VoicePhase,
    /// Survives hand loss, so a hand that leaves as a fist and returns
    /// as a fist does not cycle again.
    was_fist: bool,
    presets: PresetBank,
}

impl VoiceLifecycle {
    pub fn new(slot: SlotId, presets: PresetBank) -> Self {
        Self {
            slot,
            voice: None,
            phase: VoicePhase::Absent,
            was_fist: false,
            presets,
        }
    }

    #[inline]
    pub fn phase(&self) -> VoicePhase {
        self.phase
    }

    #[inline]
    pub fn voice(&self) -> Option<&MelodicVoice> {
        self.voice.as_ref()
    }

    #[inline]
    pub fn was_fist(&self) -> bool {
        self.was_fist
    }

    pub fn presets(&self) -> &PresetBank {
        &self.presets
    }

    /// Advance the state machine by one frame.
    ///
    /// `control` is `None` when the slot has no hand this frame.
    pub fn update(&mut self, backend: &mut dyn SynthBackend, control: Option<&MelodicControl>) -> LifecycleReport {
        let mut report = LifecycleReport::default();

        let Some(control) = control else {
            report.stopped = self.teardown(backend);
            self.phase = VoicePhase::Absent;
            return report;
        };

        let rising = control.is_fist && !self.was_fist;
        self.was_fist = control.is_fist;

        if !backend.is_ready() {
            log::trace!("slot {}: engine not ready, skipping voice actions", self.slot);
            return report;
        }

        if control.is_fist {
            report.stopped = self.teardown(backend);
            if rising {
                self.presets.cycle();
                let index = self.presets.current_index();
                backend.apply_preset(index, self.presets.current());
                report.preset = Some(index);
            }
            self.phase = VoicePhase::Fisted;
            return report;
        }

        match &mut self.voice {
            Some(voice) => {
                if voice.root() != control.note {
                    log::debug!("slot {}: retarget {} -> {}", self.slot, voice.root(), control.note);
                    voice.arpeggio.retarget(control.note);
                    backend.retarget_voice(self.slot, &voice.arpeggio);
                    report.retargeted = Some(control.note);
                }
            }
            None => {
                let voice = MelodicVoice::new(self.slot, control.note, control.velocity);
                match backend.start_voice(self.slot, &voice.arpeggio, control.velocity) {
                    Ok(()) => {
                        log::debug!("slot {}: start arpeggio on {}", self.slot, control.note);
                        report.started = Some(control.note);
                        self.voice = Some(voice);
                    }
                    Err(e) => {
                        log::warn!("slot {}: could not start voice: {}", self.slot, e);
                        self.phase = VoicePhase::Open;
                        return report;
                    }
                }
            }
        }

        if let Some(voice) = &mut self.voice {
            voice.velocity = control.velocity;
            backend.set_voice_velocity(self.slot, control.velocity);
        }
        self.phase = VoicePhase::Open;
        report
    }

    /// Stop the voice if there is one. Returns whether anything stopped.
    pub fn teardown(&mut self, backend: &mut dyn SynthBackend) -> bool {
        match self.voice.take() {
            Some(_) => {
                log::debug!("slot {}: stop arpeggio", self.slot);
                backend.stop_voice(self.slot);
                true
            }
            None => false,
        }
    }
}
