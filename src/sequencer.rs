// src/sequencer.rs
//
// Sixteen-step drum sequencer.
//
// Patterns are authored data, fixed at construction. Which drums are
// allowed to sound is decided elsewhere (the gesture side) and handed to
// every tick as an `ActiveVoiceSet` snapshot, so a change between two
// ticks takes effect on the next tick and never retroactively.

use serde::{Deserialize, Serialize};

use crate::backend::StepSink;
use crate::transport::{STEPS_PER_LOOP, StepBoundary};

// ═══════════════════════════════════════════════════════════════════
// Drum voices
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumVoice {
    Kick,
    Snare,
    HiHat,
    Clap,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; 4] = [DrumVoice::Kick, DrumVoice::Snare, DrumVoice::HiHat, DrumVoice::Clap];

    /// Display priority, highest first. Only affects which colour a step
    /// shows; every matching voice still plays.
    pub const PRIORITY: [DrumVoice; 4] = [DrumVoice::Kick, DrumVoice::Snare, DrumVoice::Clap, DrumVoice::HiHat];

    #[inline]
    fn bit(self) -> u8 {
        match self {
            DrumVoice::Kick => 1 << 0,
            DrumVoice::Snare => 1 << 1,
            DrumVoice::HiHat => 1 << 2,
            DrumVoice::Clap => 1 << 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DrumVoice::Kick => "kick",
            DrumVoice::Snare => "snare",
            DrumVoice::HiHat => "hihat",
            DrumVoice::Clap => "clap",
        }
    }

    /// Sample playback level in dB.
    pub fn level_db(self) -> f32 {
        match self {
            DrumVoice::Kick => -6.0,
            DrumVoice::Snare => 0.0,
            DrumVoice::HiHat => -2.0,
            DrumVoice::Clap => 0.0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// ActiveVoiceSet
// ═══════════════════════════════════════════════════════════════════

/// Set of drums currently enabled, packed into a bitmask so it can be
/// shared through a single atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ActiveVoiceSet(u8);

impl ActiveVoiceSet {
    const MASK: u8 = 0b1111;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self(Self::MASK)
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn insert(&mut self, voice: DrumVoice) {
        self.0 |= voice.bit();
    }

    #[inline]
    pub fn remove(&mut self, voice: DrumVoice) {
        self.0 &= !voice.bit();
    }

    #[inline]
    pub fn contains(self, voice: DrumVoice) -> bool {
        self.0 & voice.bit() != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = DrumVoice> {
        DrumVoice::ALL.into_iter().filter(move |v| self.contains(*v))
    }
}

impl FromIterator<DrumVoice> for ActiveVoiceSet {
    fn from_iter<I: IntoIterator<Item = DrumVoice>>(iter: I) -> Self {
        let mut set = ActiveVoiceSet::empty();
        for voice in iter {
            set.insert(voice);
        }
        set
    }
}

// ═══════════════════════════════════════════════════════════════════
// StepPattern
// ═══════════════════════════════════════════════════════════════════

pub type StepRow = [bool; STEPS_PER_LOOP];

/// Fixed 16-step rhythm for every drum voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepPattern {
    pub kick: StepRow,
    pub snare: StepRow,
    pub hihat: StepRow,
    pub clap: StepRow,
}

impl StepPattern {
    /// Build a pattern from the step indices each voice plays on.
    pub fn from_hits(kick: &[usize], snare: &[usize], hihat: &[usize], clap: &[usize]) -> Self {
        fn row(hits: &[usize]) -> StepRow {
            let mut row = [false; STEPS_PER_LOOP];
            for &step in hits {
                if let Some(cell) = row.get_mut(step) {
                    *cell = true;
                }
            }
            row
        }

        Self {
            kick: row(kick),
            snare: row(snare),
            hihat: row(hihat),
            clap: row(clap),
        }
    }

    /// Syncopated kick, backbeat snare, off-beat hats, clap with a pickup.
    pub fn groove() -> Self {
        Self::from_hits(
            &[0, 5, 8, 11, 13],
            &[4, 12],
            &[1, 3, 5, 7, 9, 11, 13, 15],
            &[4, 7, 12],
        )
    }

    pub fn row(&self, voice: DrumVoice) -> &StepRow {
        match voice {
            DrumVoice::Kick => &self.kick,
            DrumVoice::Snare => &self.snare,
            DrumVoice::HiHat => &self.hihat,
            DrumVoice::Clap => &self.clap,
        }
    }

    #[inline]
    pub fn hits(&self, voice: DrumVoice, step: usize) -> bool {
        self.row(voice).get(step).copied().unwrap_or(false)
    }

    /// Voices that would fire at `step` given the active set.
    pub fn firing(&self, step: usize, active: ActiveVoiceSet) -> ActiveVoiceSet {
        active.iter().filter(|v| self.hits(*v, step)).collect()
    }

    /// Highest-priority firing voice, used for step colouring.
    pub fn display_voice(&self, step: usize, active: ActiveVoiceSet) -> Option<DrumVoice> {
        DrumVoice::PRIORITY
            .into_iter()
            .find(|v| active.contains(*v) && self.hits(*v, step))
    }
}

impl Default for StepPattern {
    fn default() -> Self {
        Self::groove()
    }
}

// ═══════════════════════════════════════════════════════════════════
// Sequencer
// ═══════════════════════════════════════════════════════════════════

/// What happened on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub step: usize,
    pub time: f64,
    /// Every voice that was triggered.
    pub fired: ActiveVoiceSet,
    /// The voice whose colour the step shows.
    pub display: Option<DrumVoice>,
}

/// Step sequencer state machine over `current_step`.
pub struct Sequencer {
    pattern: StepPattern,

    /// `None` until the first tick.
    current_step: Option<usize>,
}

impl Sequencer {
    pub fn new(pattern: StepPattern) -> Self {
        Self {
            pattern,
            current_step: None,
        }
    }

    pub fn pattern(&self) -> &StepPattern {
        &self.pattern
    }

    /// Current step, 0 before the first tick.
    #[inline]
    pub fn current_step(&self) -> usize {
        self.current_step.unwrap_or(0)
    }

    /// Evaluate one step driven by the transport's subdivision index.
    pub fn tick(
        &mut self,
        step: usize,
        time: f64,
        active: ActiveVoiceSet,
        sink: &mut dyn StepSink,
    ) -> StepOutcome {
        let step = step % STEPS_PER_LOOP;
        self.current_step = Some(step);

        let fired = self.pattern.firing(step, active);
        for voice in DrumVoice::PRIORITY {
            if fired.contains(voice) {
                sink.trigger_percussion(voice, time);
            }
        }

        StepOutcome {
            step,
            time,
            fired,
            display: self.pattern.display_voice(step, active),
        }
    }

    /// Advance one step on an external clock. The first call lands on 0.
    pub fn advance(&mut self, time: f64, active: ActiveVoiceSet, sink: &mut dyn StepSink) -> StepOutcome {
        let next = match self.current_step {
            None => 0,
            Some(step) => (step + 1) % STEPS_PER_LOOP,
        };
        self.tick(next, time, active, sink)
    }

    /// Convenience for transport-driven blocks.
    pub fn tick_boundary(
        &mut self,
        boundary: &StepBoundary,
        active: ActiveVoiceSet,
        sink: &mut dyn StepSink,
    ) -> StepOutcome {
        self.tick(boundary.step, boundary.time, active, sink)
    }

    pub fn reset(&mut self) {
        self.current_step = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioCommand, CommandQueue};

    fn kicks(queue: &CommandQueue) -> Vec<f64> {
        queue
            .commands()
            .iter()
            .filter_map(|c| match c {
                AudioCommand::Percussion { voice: DrumVoice::Kick, time } => Some(*time),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_kick_per_loop() {
        let pattern = StepPattern::from_hits(&[0], &[], &[], &[]);
        let mut seq = Sequencer::new(pattern);
        let mut sink = CommandQueue::ready();
        let active: ActiveVoiceSet = [DrumVoice::Kick].into_iter().collect();

        let mut kick_steps = Vec::new();
        for i in 0..16 {
            let out = seq.advance(i as f64 * 0.15, active, &mut sink);
            if out.fired.contains(DrumVoice::Kick) {
                kick_steps.push(out.step);
            }
        }

        assert_eq!(kick_steps, vec![0]);
        assert_eq!(kicks(&sink), vec![0.0]);
    }

    #[test]
    fn test_inactive_voice_is_silent() {
        let mut seq = Sequencer::new(StepPattern::groove());
        let mut sink = CommandQueue::ready();
        for i in 0..16 {
            seq.advance(i as f64, ActiveVoiceSet::empty(), &mut sink);
        }
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_all_matching_voices_fire() {
        // Step 4 has snare and clap in the groove.
        let mut seq = Sequencer::new(StepPattern::groove());
        let mut sink = CommandQueue::ready();
        let out = seq.tick(4, 1.0, ActiveVoiceSet::all(), &mut sink);

        assert_eq!(out.fired.len(), 2);
        assert!(out.fired.contains(DrumVoice::Snare));
        assert!(out.fired.contains(DrumVoice::Clap));
        assert_eq!(out.display, Some(DrumVoice::Snare));
        assert_eq!(sink.percussion_count(), 2);
    }

    #[test]
    fn test_display_priority() {
        let p = StepPattern::groove();
        // Step 5: kick and hihat.
        assert_eq!(p.display_voice(5, ActiveVoiceSet::all()), Some(DrumVoice::Kick));
        let hats: ActiveVoiceSet = [DrumVoice::HiHat].into_iter().collect();
        assert_eq!(p.display_voice(5, hats), Some(DrumVoice::HiHat));
        assert_eq!(p.display_voice(2, ActiveVoiceSet::all()), None);
    }

    #[test]
    fn test_active_set_change_applies_next_tick() {
        let pattern = StepPattern::from_hits(&[0, 1], &[], &[], &[]);
        let mut seq = Sequencer::new(pattern);
        let mut sink = CommandQueue::ready();

        let first = seq.advance(0.0, ActiveVoiceSet::empty(), &mut sink);
        assert!(first.fired.is_empty());

        let kick: ActiveVoiceSet = [DrumVoice::Kick].into_iter().collect();
        let second = seq.advance(0.15, kick, &mut sink);
        assert_eq!(second.step, 1);
        assert!(second.fired.contains(DrumVoice::Kick));
        assert_eq!(kicks(&sink), vec![0.15]);
    }

    #[test]
    fn test_advance_wraps() {
        let mut seq = Sequencer::new(StepPattern::groove());
        let mut sink = CommandQueue::ready();
        for i in 0..17 {
            seq.advance(i as f64, ActiveVoiceSet::empty(), &mut sink);
        }
        assert_eq!(seq.current_step(), 0);
    }

    #[test]
    fn test_voice_set_bits() {
        let mut set = ActiveVoiceSet::empty();
        set.insert(DrumVoice::Clap);
        set.insert(DrumVoice::Kick);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![DrumVoice::Kick, DrumVoice::Clap]);
        set.remove(DrumVoice::Kick);
        assert_eq!(ActiveVoiceSet::from_bits(set.bits()), set);
        assert_eq!(ActiveVoiceSet::from_bits(0xff), ActiveVoiceSet::all());
    }
}
