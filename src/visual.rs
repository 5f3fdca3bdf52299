//! Values the renderer needs, computed here and drawn elsewhere.
//!
//! Covers the sixteen beat indicators, the waveform ribbon (sample
//! smoothing plus colour easing toward the current note's colour) and
//! the text shown next to each tracked hand.

use std::f64::consts::TAU;

use serde::Serialize;

use crate::mapper::{MelodicControl, PercussionControl};
use crate::sequencer::{ActiveVoiceSet, DrumVoice, StepPattern};
use crate::transport::STEPS_PER_LOOP;

// ═══════════════════════════════════════════════════════════════════
// Colour
// ═══════════════════════════════════════════════════════════════════

/// Linear RGB, each channel 0..1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From `0xRRGGBB`.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn to_hex(self) -> u32 {
        let channel = |v: f32| ((v.clamp(0.0, 1.0) * 255.0).round() as u32) & 0xff;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Move `t` of the way toward `target`.
    pub fn lerp(self, target: Rgb, t: f32) -> Self {
        Self::new(
            self.r + (target.r - self.r) * t,
            self.g + (target.g - self.g) * t,
            self.b + (target.b - self.b) * t,
        )
    }
}

pub fn drum_colour(voice: DrumVoice) -> Rgb {
    match voice {
        DrumVoice::Kick => Rgb::from_hex(0xD72828),
        DrumVoice::Snare => Rgb::from_hex(0xF36E2F),
        DrumVoice::Clap => Rgb::from_hex(0x7B4394),
        DrumVoice::HiHat => Rgb::from_hex(0x84C34E),
    }
}

/// Waveform colours, picked by scale index modulo the palette length.
pub const WAVEFORM_PALETTE: [u32; 5] = [0x7B4394, 0x84C34E, 0xF36E2F, 0xD72828, 0x66FFFF];

pub fn waveform_colour(note_index: usize) -> Rgb {
    Rgb::from_hex(WAVEFORM_PALETTE[note_index % WAVEFORM_PALETTE.len()])
}

// ═══════════════════════════════════════════════════════════════════
// Beat indicators
// ═══════════════════════════════════════════════════════════════════

/// Scale of the current step's marker: 2.0 at the onset, 1.0 mid-step.
#[inline]
pub fn beat_pulse(step_progress: f64) -> f32 {
    (1.5 + 0.5 * (TAU * step_progress).cos()) as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepIndicator {
    pub colour: Rgb,
    pub opacity: f32,
    pub scale: f32,
    pub voice: Option<DrumVoice>,
}

/// Indicator state for all sixteen steps.
pub fn beat_indicators(
    pattern: &StepPattern,
    active: ActiveVoiceSet,
    current_step: usize,
    step_progress: f64,
) -> [StepIndicator; STEPS_PER_LOOP] {
    let pulse = beat_pulse(step_progress);
    std::array::from_fn(|step| {
        let voice = pattern.display_voice(step, active);
        StepIndicator {
            colour: voice.map(drum_colour).unwrap_or(Rgb::WHITE),
            opacity: if voice.is_some() { 0.9 } else { 0.5 },
            scale: if step == current_step { pulse } else { 1.0 },
            voice,
        }
    })
}

// ═══════════════════════════════════════════════════════════════════
// Waveform ribbon
// ═══════════════════════════════════════════════════════════════════

/// Per-frame colour easing factor.
pub const COLOUR_EASE: f32 = 0.05;

/// Smoothed analyser samples and the ribbon colour.
#[derive(Debug, Clone)]
pub struct WaveformTrace {
    alpha: f32,
    samples: Vec<f32>,
    colour: Rgb,
    target: Rgb,
}

impl WaveformTrace {
    pub fn new(alpha: f32) -> Self {
        let start = waveform_colour(0);
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            samples: Vec::new(),
            colour: start,
            target: start,
        }
    }

    /// Blend one analyser frame into the trace and ease the colour.
    ///
    /// The trace starts flat; a buffer size change restarts it flat.
    pub fn update(&mut self, raw: &[f32]) -> &[f32] {
        if self.samples.len() != raw.len() {
            self.samples = vec![0.0; raw.len()];
        }
        for (s, r) in self.samples.iter_mut().zip(raw) {
            *s = self.alpha * r + (1.0 - self.alpha) * *s;
        }
        self.colour = self.colour.lerp(self.target, COLOUR_EASE);
        &self.samples
    }

    pub fn set_note_index(&mut self, note_index: usize) {
        self.target = waveform_colour(note_index);
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn colour(&self) -> Rgb {
        self.colour
    }

    pub fn target(&self) -> Rgb {
        self.target
    }
}

impl Default for WaveformTrace {
    fn default() -> Self {
        Self::new(0.4)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Hand labels
// ═══════════════════════════════════════════════════════════════════

const NOTE_NAMES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];

/// Scientific pitch name with flats, MIDI 60 = "C4".
pub fn note_name(midi: u8) -> String {
    let octave = (midi / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(midi % 12) as usize], octave)
}

/// Labels drawn beside the melodic hand. A fist shows the preset number.
pub fn melodic_labels(control: &MelodicControl, preset_index: usize) -> Vec<String> {
    if control.is_fist {
        vec![format!("SYNTH {}", preset_index + 1)]
    } else {
        vec![
            format!("Volume: {:.2}", control.velocity),
            format!("Pitch: {}", note_name(control.note)),
        ]
    }
}

pub fn percussion_label(control: &PercussionControl) -> String {
    let names: Vec<&str> = control.active.iter().map(DrumVoice::name).collect();
    if names.is_empty() {
        "Drums: None".to_string()
    } else {
        format!("Drums: {}", names.join(", "))
    }
}
