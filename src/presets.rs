// src/presets.rs
//
// FM synth presets and the bank the fist gesture cycles through.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_REVERB_WET: f32 = 0.8;
pub const DEFAULT_DELAY_WET: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// ADSR times in seconds, sustain as a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Envelope {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

fn default_reverb_wet() -> f32 {
    DEFAULT_REVERB_WET
}

/// Two-operator FM voice settings plus the send levels it wants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthPreset {
    pub name: String,
    pub harmonicity: f32,
    pub modulation_index: f32,
    pub oscillator: Waveform,
    pub envelope: Envelope,
    pub modulation: Waveform,
    pub modulation_envelope: Envelope,
    #[serde(default = "default_reverb_wet")]
    pub reverb_wet: f32,
    #[serde(default)]
    pub delay_wet: f32,
}

impl SynthPreset {
    pub fn clean_sine() -> Self {
        Self {
            name: "Clean Sine".into(),
            harmonicity: 4.0,
            modulation_index: 3.0,
            oscillator: Waveform::Sine,
            envelope: Envelope::new(0.01, 0.2, 0.5, 1.0),
            modulation: Waveform::Sine,
            modulation_envelope: Envelope::new(0.1, 0.01, 1.0, 0.5),
            reverb_wet: DEFAULT_REVERB_WET,
            delay_wet: DEFAULT_DELAY_WET,
        }
    }

    /// Plucky, staccato envelope.
    pub fn buzzy_saw() -> Self {
        Self {
            name: "Buzzy Sawtooth".into(),
            harmonicity: 1.0,
            modulation_index: 8.0,
            oscillator: Waveform::Sawtooth,
            envelope: Envelope::new(0.01, 0.15, 0.05, 0.2),
            modulation: Waveform::Square,
            modulation_envelope: Envelope::new(0.05, 0.2, 0.4, 0.6),
            reverb_wet: DEFAULT_REVERB_WET,
            delay_wet: DEFAULT_DELAY_WET,
        }
    }

    /// Rhodes-like, drier with a touch of delay.
    pub fn funk_keys() -> Self {
        Self {
            name: "Funk Electric Piano".into(),
            harmonicity: 2.0,
            modulation_index: 12.0,
            oscillator: Waveform::Sine,
            envelope: Envelope::new(0.02, 0.3, 0.2, 0.8),
            modulation: Waveform::Sine,
            modulation_envelope: Envelope::new(0.05, 0.2, 0.1, 0.8),
            reverb_wet: 0.3,
            delay_wet: 0.1,
        }
    }

    pub fn factory_bank() -> Vec<SynthPreset> {
        vec![Self::clean_sine(), Self::buzzy_saw(), Self::funk_keys()]
    }
}

/// Ordered, non-empty preset list with a current index.
#[derive(Debug, Clone)]
pub struct PresetBank {
    presets: Vec<SynthPreset>,
    current: usize,
}

impl PresetBank {
    pub fn new(presets: Vec<SynthPreset>) -> ConfigResult<Self> {
        if presets.is_empty() {
            return Err(ConfigError::NoPresets);
        }
        Ok(Self {
            presets,
            current: 0,
        })
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &SynthPreset {
        &self.presets[self.current]
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Advance to the next preset, wrapping at the end.
    pub fn cycle(&mut self) -> &SynthPreset {
        self.current = (self.current + 1) % self.presets.len();
        log::info!("switched to synth preset {} ({})", self.current, self.presets[self.current].name);
        &self.presets[self.current]
    }
}

impl Default for PresetBank {
    fn default() -> Self {
        Self {
            presets: SynthPreset::factory_bank(),
            current: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_wraps() {
        let mut bank = PresetBank::default();
        assert_eq!(bank.current().name, "Clean Sine");
        bank.cycle();
        bank.cycle();
        assert_eq!(bank.current().name, "Funk Electric Piano");
        bank.cycle();
        assert_eq!(bank.current_index(), 0);
    }

    #[test]
    fn test_empty_bank_rejected() {
        assert!(matches!(PresetBank::new(Vec::new()), Err(ConfigError::NoPresets)));
    }

    #[test]
    fn test_wet_defaults_when_missing() {
        let json = r#"{
            "name": "Bare",
            "harmonicity": 1.0,
            "modulation_index": 2.0,
            "oscillator": "triangle",
            "envelope": { "attack": 0.01, "decay": 0.1, "sustain": 0.5, "release": 0.3 },
            "modulation": "sine",
            "modulation_envelope": { "attack": 0.01, "decay": 0.1, "sustain": 0.5, "release": 0.3 }
        }"#;
        let preset: SynthPreset = serde_json::from_str(json).unwrap();
        assert_eq!(preset.reverb_wet, DEFAULT_REVERB_WET);
        assert_eq!(preset.delay_wet, DEFAULT_DELAY_WET);
        assert_eq!(preset.oscillator, Waveform::Triangle);
    }
}
