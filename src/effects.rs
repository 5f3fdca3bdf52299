// src/effects.rs
//
// DJ effect rack: four toggleable effects and the crossfader.

use serde::{Deserialize, Serialize};

use crate::gesture::Finger;

/// Minimum time between two gesture toggles, in seconds.
pub const DEFAULT_TOGGLE_COOLDOWN: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Delay,
    Reverb,
    Filter,
    Distortion,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Delay,
        EffectKind::Reverb,
        EffectKind::Filter,
        EffectKind::Distortion,
    ];

    /// Fixed finger-to-effect table.
    pub fn for_finger(finger: Finger) -> Self {
        match finger {
            Finger::Index => EffectKind::Delay,
            Finger::Middle => EffectKind::Reverb,
            Finger::Ring => EffectKind::Filter,
            Finger::Pinky => EffectKind::Distortion,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Delay => "delay",
            EffectKind::Reverb => "reverb",
            EffectKind::Filter => "filter",
            EffectKind::Distortion => "distortion",
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EffectState {
    pub active: bool,
    /// Wet amount, 0..1.
    pub intensity: f32,
}

/// Effect states plus the crossfader position.
///
/// Written only by the gesture side. Toggles are rate limited on frame
/// timestamps so a held pose cannot flip an effect every frame.
#[derive(Debug, Clone)]
pub struct EffectRack {
    states: [EffectState; 4],
    crossfader: f32,
    selected: Option<EffectKind>,
    cooldown: f64,
    last_toggle: Option<f64>,
    /// Effect already toggled by the pinch that is still held.
    held: Option<EffectKind>,
}

impl EffectRack {
    pub fn new(cooldown: f64) -> Self {
        Self {
            states: [EffectState::default(); 4],
            crossfader: 0.5,
            selected: None,
            cooldown: cooldown.max(0.0),
            last_toggle: None,
            held: None,
        }
    }

    pub fn state(&self, kind: EffectKind) -> EffectState {
        self.states[kind.slot()]
    }

    /// Most recently toggled effect.
    #[inline]
    pub fn selected(&self) -> Option<EffectKind> {
        self.selected
    }

    #[inline]
    pub fn crossfader(&self) -> f32 {
        self.crossfader
    }

    pub fn set_crossfader(&mut self, position: f32) -> f32 {
        self.crossfader = position.clamp(0.0, 1.0);
        self.crossfader
    }

    /// Flip `kind` on or off at frame time `now`.
    ///
    /// Returns the new `active` value, or `None` while the cooldown from
    /// the previous toggle is still running.
    pub fn toggle(&mut self, kind: EffectKind, now: f64) -> Option<bool> {
        if let Some(last) = self.last_toggle {
            if now - last < self.cooldown {
                return None;
            }
        }

        let state = &mut self.states[kind.slot()];
        state.active = !state.active;
        self.selected = Some(kind);
        self.last_toggle = Some(now);

        log::debug!("effect {} {}", kind.name(), if state.active { "on" } else { "off" });
        Some(state.active)
    }

    /// Selector pinch held on `kind` at frame time `now`.
    ///
    /// Toggles once per hold: a held pose fires again only after
    /// `release` or when the finger pattern picks another effect. A press
    /// that lands inside the cooldown stays pending until the cooldown
    /// runs out, still only once.
    pub fn press(&mut self, kind: EffectKind, now: f64) -> Option<bool> {
        if self.held == Some(kind) {
            return None;
        }
        let active = self.toggle(kind, now)?;
        self.held = Some(kind);
        Some(active)
    }

    /// Selector pinch let go.
    #[inline]
    pub fn release(&mut self) {
        self.held = None;
    }

    pub fn set_intensity(&mut self, kind: EffectKind, intensity: f32) -> EffectState {
        let state = &mut self.states[kind.slot()];
        state.intensity = intensity.clamp(0.0, 1.0);
        *state
    }

    /// Active effects in table order.
    pub fn active(&self) -> impl Iterator<Item = EffectKind> + '_ {
        EffectKind::ALL.into_iter().filter(|k| self.state(*k).active)
    }
}

impl Default for EffectRack {
    fn default() -> Self {
        Self::new(DEFAULT_TOGGLE_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_respects_cooldown() {
        let mut rack = EffectRack::default();
        assert_eq!(rack.toggle(EffectKind::Delay, 10.0), Some(true));
        assert_eq!(rack.toggle(EffectKind::Delay, 10.5), None);
        assert_eq!(rack.toggle(EffectKind::Filter, 11.0), None);
        assert_eq!(rack.toggle(EffectKind::Delay, 11.5), Some(false));
        assert_eq!(rack.selected(), Some(EffectKind::Delay));
    }

    #[test]
    fn test_held_press_fires_once() {
        let mut rack = EffectRack::default();
        assert_eq!(rack.press(EffectKind::Reverb, 0.0), Some(true));
        for i in 1..180 {
            assert_eq!(rack.press(EffectKind::Reverb, i as f64 / 30.0), None);
        }
        assert!(rack.state(EffectKind::Reverb).active);

        rack.release();
        assert_eq!(rack.press(EffectKind::Reverb, 7.0), Some(false));
    }

    #[test]
    fn test_press_inside_cooldown_stays_pending() {
        let mut rack = EffectRack::default();
        assert_eq!(rack.press(EffectKind::Delay, 0.0), Some(true));
        // Switch finger while held: a new effect, but still cooling down.
        assert_eq!(rack.press(EffectKind::Filter, 0.5), None);
        assert_eq!(rack.press(EffectKind::Filter, 1.6), Some(true));
        assert_eq!(rack.press(EffectKind::Filter, 4.0), None);
    }

    #[test]
    fn test_first_toggle_is_immediate() {
        let mut rack = EffectRack::default();
        assert_eq!(rack.toggle(EffectKind::Reverb, 0.0), Some(true));
        assert_eq!(rack.active().collect::<Vec<_>>(), vec![EffectKind::Reverb]);
    }

    #[test]
    fn test_values_clamped() {
        let mut rack = EffectRack::default();
        assert_eq!(rack.set_crossfader(1.4), 1.0);
        assert_eq!(rack.set_crossfader(-0.1), 0.0);
        assert_eq!(rack.set_intensity(EffectKind::Distortion, 2.0).intensity, 1.0);
    }

    #[test]
    fn test_finger_table() {
        assert_eq!(EffectKind::for_finger(Finger::Index), EffectKind::Delay);
        assert_eq!(EffectKind::for_finger(Finger::Pinky), EffectKind::Distortion);
    }
}
