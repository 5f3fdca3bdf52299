// src/detector.rs
//
// Hand detector seam and the policy that maps detections to slots.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;
use crate::landmark::{DetectedHand, Handedness, LANDMARK_COUNT, landmarks_from_flat};
use crate::voice::SlotId;

/// Number of tracked hand slots.
pub const SLOT_COUNT: usize = 2;

/// Slot that owns the melodic voice.
pub const MELODIC_SLOT: SlotId = 0;

/// Slot that gates drums and effects.
pub const PERCUSSION_SLOT: SlotId = 1;

/// Produces zero, one or two hands per video frame.
pub trait HandDetector {
    /// `timestamp` is the video time in seconds of the frame to analyse.
    fn detect(&mut self, timestamp: f64) -> Result<Vec<DetectedHand>, DetectorError>;
}

/// How detections are assigned to slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RolePolicy {
    /// Detector order: first hand is melodic, second is percussion.
    #[default]
    BySlot,
    /// The hand labelled `melodic` plays the arpeggio, the other hand the
    /// drums. Unlabelled hands fill whichever slot is left.
    ByHandedness { melodic: Handedness },
}

/// Place detected hands into the two slots according to `policy`.
pub fn assign_slots(policy: RolePolicy, hands: Vec<DetectedHand>) -> [Option<DetectedHand>; SLOT_COUNT] {
    let mut slots: [Option<DetectedHand>; SLOT_COUNT] = [None, None];

    match policy {
        RolePolicy::BySlot => {
            for (slot, hand) in slots.iter_mut().zip(hands) {
                *slot = Some(hand);
            }
        }
        RolePolicy::ByHandedness { melodic } => {
            let mut leftovers = Vec::new();
            for hand in hands {
                let label = hand.handedness;
                if label == melodic && slots[MELODIC_SLOT].is_none() {
                    slots[MELODIC_SLOT] = Some(hand);
                } else if label != melodic && label != Handedness::Unknown && slots[PERCUSSION_SLOT].is_none() {
                    slots[PERCUSSION_SLOT] = Some(hand);
                } else {
                    leftovers.push(hand);
                }
            }

            let mut leftovers = leftovers.into_iter();
            for slot in slots.iter_mut().filter(|s| s.is_none()) {
                *slot = leftovers.next();
            }
        }
    }

    slots
}

/// Decode hands from one flat buffer of `LANDMARK_COUNT` xyz triples
/// per hand, with comma separated handedness labels ("Left,Right").
/// Missing labels read as unknown.
pub fn hands_from_flat(coords: &[f32], labels: &str) -> Result<Vec<DetectedHand>, DetectorError> {
    let per_hand = LANDMARK_COUNT * 3;
    if coords.len() % per_hand != 0 {
        return Err(DetectorError::Malformed(format!(
            "{} values is not a whole number of hands",
            coords.len()
        )));
    }

    let mut labels = labels.split(',').filter(|l| !l.trim().is_empty());
    coords
        .chunks_exact(per_hand)
        .map(|chunk| {
            let handedness = labels.next().map(Handedness::from_label).unwrap_or_default();
            Ok(DetectedHand::new(landmarks_from_flat(chunk)?, handedness))
        })
        .collect()
}

/// Detector that replays a fixed list of frames, then reports no hands.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDetector {
    frames: VecDeque<Vec<DetectedHand>>,
}

impl ScriptedDetector {
    pub fn new(frames: impl IntoIterator<Item = Vec<DetectedHand>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, hands: Vec<DetectedHand>) {
        self.frames.push_back(hands);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl HandDetector for ScriptedDetector {
    fn detect(&mut self, _timestamp: f64) -> Result<Vec<DetectedHand>, DetectorError> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;

    fn hand(label: Handedness, marker: f32) -> DetectedHand {
        DetectedHand::new(vec![Landmark::new(marker, 0.0, 0.0)], label)
    }

    fn marker(slot: &Option<DetectedHand>) -> Option<f32> {
        slot.as_ref().map(|h| h.landmarks[0].x)
    }

    #[test]
    fn test_by_slot_follows_detector_order() {
        let slots = assign_slots(
            RolePolicy::BySlot,
            vec![hand(Handedness::Left, 0.1), hand(Handedness::Right, 0.2), hand(Handedness::Left, 0.3)],
        );
        assert_eq!(marker(&slots[0]), Some(0.1));
        assert_eq!(marker(&slots[1]), Some(0.2));

        let slots = assign_slots(RolePolicy::BySlot, vec![]);
        assert!(slots.iter().all(Option::is_none));
    }

    #[test]
    fn test_by_handedness_picks_melodic_hand() {
        let policy = RolePolicy::ByHandedness {
            melodic: Handedness::Right,
        };
        let slots = assign_slots(policy, vec![hand(Handedness::Left, 0.1), hand(Handedness::Right, 0.2)]);
        assert_eq!(marker(&slots[MELODIC_SLOT]), Some(0.2));
        assert_eq!(marker(&slots[PERCUSSION_SLOT]), Some(0.1));
    }

    #[test]
    fn test_by_handedness_single_other_hand() {
        let policy = RolePolicy::ByHandedness {
            melodic: Handedness::Right,
        };
        let slots = assign_slots(policy, vec![hand(Handedness::Left, 0.1)]);
        assert!(slots[MELODIC_SLOT].is_none());
        assert_eq!(marker(&slots[PERCUSSION_SLOT]), Some(0.1));
    }

    #[test]
    fn test_by_handedness_unknown_fills_gaps() {
        let policy = RolePolicy::ByHandedness {
            melodic: Handedness::Left,
        };
        let slots = assign_slots(policy, vec![hand(Handedness::Unknown, 0.1), hand(Handedness::Left, 0.2)]);
        assert_eq!(marker(&slots[MELODIC_SLOT]), Some(0.2));
        assert_eq!(marker(&slots[PERCUSSION_SLOT]), Some(0.1));
    }

    #[test]
    fn test_scripted_detector_runs_dry() {
        let mut d = ScriptedDetector::new([vec![hand(Handedness::Left, 0.1)]]);
        assert_eq!(d.detect(0.0).unwrap().len(), 1);
        assert!(d.detect(0.1).unwrap().is_empty());
    }

    #[test]
    fn test_hands_from_flat() {
        let mut coords = vec![0.25; LANDMARK_COUNT * 3];
        coords.extend(vec![0.75; LANDMARK_COUNT * 3]);

        let hands = hands_from_flat(&coords, "Right").unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].handedness, Handedness::Right);
        assert_eq!(hands[1].handedness, Handedness::Unknown);
        assert_eq!(hands[1].landmarks[LANDMARK_COUNT - 1].x, 0.75);

        assert!(hands_from_flat(&[], "").unwrap().is_empty());
        assert!(matches!(hands_from_flat(&coords[1..], ""), Err(DetectorError::Malformed(_))));
    }

    #[test]
    fn test_policy_json() {
        let p: RolePolicy = serde_json::from_str(r#"{"policy":"by_handedness","melodic":"Right"}"#).unwrap();
        assert_eq!(
            p,
            RolePolicy::ByHandedness {
                melodic: Handedness::Right
            }
        );
    }
}
