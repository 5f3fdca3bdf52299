// src/config.rs
//
// Engine configuration. Every field has a default matching the
// installation's tuning, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::detector::RolePolicy;
use crate::effects::{DEFAULT_TOGGLE_COOLDOWN, EffectKind};
use crate::error::{ConfigError, ConfigResult};
use crate::gesture::GestureConfig;
use crate::mapper::Scale;
use crate::presets::{PresetBank, SynthPreset};
use crate::sequencer::StepPattern;
use crate::smoother::DEFAULT_ALPHA;

pub const DEFAULT_BPM: f64 = 100.0;
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

/// Arpeggio velocity before the melodic hand has set one.
pub const DEFAULT_VELOCITY: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Seconds between two gesture toggles.
    pub toggle_cooldown: f64,
    /// Effect selected when the finger pattern is not a single finger.
    pub fallback: EffectKind,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            toggle_cooldown: DEFAULT_TOGGLE_COOLDOWN,
            fallback: EffectKind::Reverb,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Landmark smoothing factor, (0, 1].
    pub smoothing: f32,
    pub gesture: GestureConfig,
    pub scale: Scale,
    pub bpm: f64,
    pub sample_rate: f64,
    pub default_velocity: f32,
    pub role_policy: RolePolicy,
    pub pattern: StepPattern,
    pub presets: Vec<SynthPreset>,
    pub effects: EffectsConfig,
    /// Smoothing factor for the waveform ribbon.
    pub waveform_smoothing: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_ALPHA,
            gesture: GestureConfig::default(),
            scale: Scale::default(),
            bpm: DEFAULT_BPM,
            sample_rate: DEFAULT_SAMPLE_RATE,
            default_velocity: DEFAULT_VELOCITY,
            role_policy: RolePolicy::default(),
            pattern: StepPattern::default(),
            presets: SynthPreset::factory_bank(),
            effects: EffectsConfig::default(),
            waveform_smoothing: 0.4,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::InvalidSmoothing(self.smoothing));
        }
        if !(self.waveform_smoothing > 0.0 && self.waveform_smoothing <= 1.0) {
            return Err(ConfigError::InvalidSmoothing(self.waveform_smoothing));
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(ConfigError::InvalidTempo(self.bpm));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.scale.is_empty() {
            return Err(ConfigError::EmptyScale);
        }
        if self.presets.is_empty() {
            return Err(ConfigError::NoPresets);
        }
        Ok(())
    }

    pub fn preset_bank(&self) -> ConfigResult<PresetBank> {
        PresetBank::new(self.presets.clone())
    }
}
