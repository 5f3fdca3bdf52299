// src/mapper.rs
//
// Classifier readings -> musical control values.

use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::error::{ConfigError, ConfigResult};
use crate::gesture::{Finger, FingerStates, HandReading};
use crate::sequencer::{ActiveVoiceSet, DrumVoice};

/// C minor pentatonic, C3 to Eb5.
pub const DEFAULT_SCALE: [u8; 12] = [48, 51, 53, 55, 58, 60, 63, 65, 67, 70, 72, 75];

// ═══════════════════════════════════════════════════════════════════
// Scale
// ═══════════════════════════════════════════════════════════════════

/// Ascending, non-empty list of MIDI notes that height is quantized to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Scale {
    notes: Vec<u8>,
}

impl Scale {
    pub fn new(notes: Vec<u8>) -> ConfigResult<Self> {
        if notes.is_empty() {
            return Err(ConfigError::EmptyScale);
        }
        if let Some(w) = notes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ConfigError::UnsortedScale { prev: w[0], next: w[1] });
        }
        Ok(Self { notes })
    }

    #[inline]
    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// `floor(p * N)` clamped to `[0, N-1]`.
    pub fn index_for(&self, position: f32) -> usize {
        let n = self.notes.len();
        if !position.is_finite() || position <= 0.0 {
            return 0;
        }
        ((position * n as f32).floor() as usize).min(n - 1)
    }

    /// Quantize a normalized height to (scale index, note).
    pub fn quantize(&self, position: f32) -> (usize, u8) {
        let i = self.index_for(position);
        (i, self.notes[i])
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            notes: DEFAULT_SCALE.to_vec(),
        }
    }
}

impl TryFrom<Vec<u8>> for Scale {
    type Error = ConfigError;

    fn try_from(notes: Vec<u8>) -> Result<Self, Self::Error> {
        Scale::new(notes)
    }
}

impl From<Scale> for Vec<u8> {
    fn from(scale: Scale) -> Self {
        scale.notes
    }
}

// ═══════════════════════════════════════════════════════════════════
// Scalar mappings
// ═══════════════════════════════════════════════════════════════════

/// Velocity is the pinch strength, clamped.
#[inline]
pub fn velocity_from_pinch(strength: f32) -> f32 {
    strength.clamp(0.0, 1.0)
}

#[inline]
pub fn crossfader_from_horizontal(position: f32) -> f32 {
    position.clamp(0.0, 1.0)
}

pub fn drum_for_finger(finger: Finger) -> DrumVoice {
    match finger {
        Finger::Index => DrumVoice::Kick,
        Finger::Middle => DrumVoice::Snare,
        Finger::Ring => DrumVoice::HiHat,
        Finger::Pinky => DrumVoice::Clap,
    }
}

/// Drums enabled by the raised fingers. Replaces the previous set outright.
pub fn active_drums(fingers: &FingerStates) -> ActiveVoiceSet {
    fingers.raised().map(drum_for_finger).collect()
}

/// Effect picked by the finger pattern: exactly one raised finger maps
/// through the table, anything else gives `fallback`.
pub fn select_effect(fingers: &FingerStates, fallback: EffectKind) -> EffectKind {
    fingers
        .single_raised()
        .map(EffectKind::for_finger)
        .unwrap_or(fallback)
}

// ═══════════════════════════════════════════════════════════════════
// Per-role control
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    /// Plays the arpeggio.
    Melodic,
    /// Gates drums and drives the effect rack.
    Percussion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelodicControl {
    pub note: u8,
    pub note_index: usize,
    pub velocity: f32,
    pub is_fist: bool,
    pub crossfader: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercussionControl {
    pub fingers: FingerStates,
    pub active: ActiveVoiceSet,
    /// Set while the secondary pinch is held.
    pub effect: Option<EffectKind>,
    pub secondary_pinch: bool,
    pub height: f32,
}

/// Control values derived from one hand, tagged by role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotControl {
    Melodic(MelodicControl),
    Percussion(PercussionControl),
}

impl SlotControl {
    pub fn role(&self) -> SlotRole {
        match self {
            SlotControl::Melodic(_) => SlotRole::Melodic,
            SlotControl::Percussion(_) => SlotRole::Percussion,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlMapper {
    scale: Scale,
    fallback_effect: EffectKind,
}

impl ControlMapper {
    pub fn new(scale: Scale, fallback_effect: EffectKind) -> Self {
        Self {
            scale,
            fallback_effect,
        }
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn map(&self, role: SlotRole, reading: &HandReading) -> SlotControl {
        match role {
            SlotRole::Melodic => SlotControl::Melodic(self.melodic(reading)),
            SlotRole::Percussion => SlotControl::Percussion(self.percussion(reading)),
        }
    }

    pub fn melodic(&self, reading: &HandReading) -> MelodicControl {
        let (note_index, note) = self.scale.quantize(reading.height);
        MelodicControl {
            note,
            note_index,
            velocity: velocity_from_pinch(reading.pinch_strength),
            is_fist: reading.is_fist,
            crossfader: crossfader_from_horizontal(reading.horizontal),
        }
    }

    pub fn percussion(&self, reading: &HandReading) -> PercussionControl {
        let effect = reading
            .secondary_pinch
            .then(|| select_effect(&reading.fingers, self.fallback_effect));

        PercussionControl {
            fingers: reading.fingers,
            active: active_drums(&reading.fingers),
            effect,
            secondary_pinch: reading.secondary_pinch,
            height: reading.height,
        }
    }
}

impl Default for ControlMapper {
    fn default() -> Self {
        Self::new(Scale::default(), EffectKind::Reverb)
    }
}
