//! Gesture classification over one smoothed landmark set.
//!
//! Every function here is pure and total: a short or empty landmark list
//! yields `false` / `0.0` rather than a panic, because the detector can
//! hand us partial skeletons and the frame loop must keep running.

use serde::{Deserialize, Serialize};

use crate::landmark::{LANDMARK_COUNT, Landmark, VideoViewport, index};

/// Tunable thresholds for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Max planar distance from fingertip to palm for a fist.
    pub fist_threshold: f32,

    /// Multiplier from pinch distance to velocity before clamping.
    pub pinch_gain: f32,

    /// Thumb-to-middle distance under which the secondary pinch is held.
    pub secondary_pinch_threshold: f32,

    /// Mirror horizontal position to match a mirrored camera preview.
    pub mirror_x: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            fist_threshold: 0.1,
            pinch_gain: 5.0,
            secondary_pinch_threshold: 0.05,
            mirror_x: true,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Fingers
// ═══════════════════════════════════════════════════════════════════

/// The four fingers that take part in finger-up gestures.
///
/// The thumb is deliberately absent; it only contributes to pinch and
/// fist detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    #[inline]
    pub fn tip(self) -> usize {
        match self {
            Finger::Index => index::INDEX_TIP,
            Finger::Middle => index::MIDDLE_TIP,
            Finger::Ring => index::RING_TIP,
            Finger::Pinky => index::PINKY_TIP,
        }
    }

    /// The joint just below the tip.
    #[inline]
    pub fn pip(self) -> usize {
        match self {
            Finger::Index => index::INDEX_PIP,
            Finger::Middle => index::MIDDLE_PIP,
            Finger::Ring => index::RING_PIP,
            Finger::Pinky => index::PINKY_PIP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

/// Up/down state of each finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerStates {
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    #[inline]
    pub fn is_up(&self, finger: Finger) -> bool {
        match finger {
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    fn set(&mut self, finger: Finger, up: bool) {
        match finger {
            Finger::Index => self.index = up,
            Finger::Middle => self.middle = up,
            Finger::Ring => self.ring = up,
            Finger::Pinky => self.pinky = up,
        }
    }

    /// Raised fingers, index first.
    pub fn raised(&self) -> impl Iterator<Item = Finger> + '_ {
        Finger::ALL.into_iter().filter(|f| self.is_up(*f))
    }

    pub fn raised_count(&self) -> usize {
        self.raised().count()
    }

    /// The raised finger, if exactly one is up.
    pub fn single_raised(&self) -> Option<Finger> {
        let mut raised = self.raised();
        match (raised.next(), raised.next()) {
            (Some(f), None) => Some(f),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Classifier functions
// ═══════════════════════════════════════════════════════════════════

/// True iff every fingertip lies within `threshold` of the palm.
pub fn is_fist(landmarks: &[Landmark], threshold: f32) -> bool {
    if landmarks.len() < LANDMARK_COUNT {
        return false;
    }

    let palm = &landmarks[index::PALM];
    index::FINGERTIPS
        .iter()
        .all(|&tip| landmarks[tip].planar_distance(palm) <= threshold)
}

/// A finger is up when its tip is strictly above the joint below it.
pub fn is_finger_up(landmarks: &[Landmark], finger: Finger) -> bool {
    match (landmarks.get(finger.tip()), landmarks.get(finger.pip())) {
        (Some(tip), Some(joint)) => tip.y < joint.y,
        _ => false,
    }
}

pub fn finger_states(landmarks: &[Landmark]) -> FingerStates {
    let mut states = FingerStates::default();
    for finger in Finger::ALL {
        states.set(finger, is_finger_up(landmarks, finger));
    }
    states
}

/// Planar distance between two landmarks, `0.0` if either is missing.
pub fn landmark_distance(landmarks: &[Landmark], a: usize, b: usize) -> f32 {
    match (landmarks.get(a), landmarks.get(b)) {
        (Some(a), Some(b)) => a.planar_distance(b),
        _ => 0.0,
    }
}

/// Thumb-tip to index-tip distance.
#[inline]
pub fn pinch_distance(landmarks: &[Landmark]) -> f32 {
    landmark_distance(landmarks, index::THUMB_TIP, index::INDEX_TIP)
}

/// Scale a pinch distance into a [0, 1] strength.
#[inline]
pub fn pinch_strength(distance: f32, gain: f32) -> f32 {
    (distance * gain).clamp(0.0, 1.0)
}

/// Height of `reference` on screen: 0 at the bottom, 1 at the top.
pub fn normalized_height(landmarks: &[Landmark], reference: usize, viewport: &VideoViewport) -> f32 {
    match landmarks.get(reference) {
        Some(lm) => {
            let (_, y) = viewport.to_visible(lm);
            (1.0 - y).clamp(0.0, 1.0)
        }
        None => 0.0,
    }
}

/// Horizontal position of `reference`, mirrored when the preview is.
pub fn normalized_horizontal(
    landmarks: &[Landmark],
    reference: usize,
    viewport: &VideoViewport,
    mirrored: bool,
) -> f32 {
    match landmarks.get(reference) {
        Some(lm) => {
            let (x, _) = viewport.to_visible(lm);
            let x = if mirrored { 1.0 - x } else { x };
            x.clamp(0.0, 1.0)
        }
        None => 0.0,
    }
}

// ═══════════════════════════════════════════════════════════════════
// HandReading
// ═══════════════════════════════════════════════════════════════════

/// Everything the mapper needs to know about one hand this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandReading {
    pub is_fist: bool,
    pub fingers: FingerStates,
    /// Thumb-index distance in normalized units.
    pub pinch_distance: f32,
    /// Pinch distance scaled to [0, 1].
    pub pinch_strength: f32,
    /// Thumb-middle pinch held (DJ effect selector).
    pub secondary_pinch: bool,
    /// Palm height, 0 bottom .. 1 top.
    pub height: f32,
    /// Palm horizontal position, 0 left .. 1 right as the user sees it.
    pub horizontal: f32,
}

impl HandReading {
    pub fn classify(landmarks: &[Landmark], viewport: &VideoViewport, config: &GestureConfig) -> Self {
        let pinch_distance = pinch_distance(landmarks);
        let secondary = landmarks.len() >= LANDMARK_COUNT
            && landmark_distance(landmarks, index::THUMB_TIP, index::MIDDLE_TIP)
                < config.secondary_pinch_threshold;

        Self {
            is_fist: is_fist(landmarks, config.fist_threshold),
            fingers: finger_states(landmarks),
            pinch_distance,
            pinch_strength: pinch_strength(pinch_distance, config.pinch_gain),
            secondary_pinch: secondary,
            height: normalized_height(landmarks, index::PALM, viewport),
            horizontal: normalized_horizontal(landmarks, index::PALM, viewport, config.mirror_x),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Synthetic hands shared by tests across the crate.

    use super::*;

    /// An open hand with the palm at (`x`, `y`): all fingers up, thumb
    /// and index spread `pinch` apart.
    pub fn open_hand_at(x: f32, y: f32, pinch: f32) -> Vec<Landmark> {
        let mut lms = vec![Landmark::new(x, y, 0.0); LANDMARK_COUNT];
        lms[index::WRIST] = Landmark::new(x, y + 0.15, 0.0);
        for finger in Finger::ALL {
            lms[finger.pip()] = Landmark::new(x, y - 0.1, 0.0);
            lms[finger.tip()] = Landmark::new(x, y - 0.2, 0.0);
        }
        lms[index::INDEX_TIP] = Landmark::new(x, y - 0.2, 0.0);
        lms[index::THUMB_TIP] = Landmark::new(x + pinch, y - 0.2, 0.0);
        lms
    }

    /// A closed fist with every fingertip on the palm.
    pub fn fist_at(x: f32, y: f32) -> Vec<Landmark> {
        let mut lms = vec![Landmark::new(x, y, 0.0); LANDMARK_COUNT];
        lms[index::WRIST] = Landmark::new(x, y + 0.15, 0.0);
        for finger in Finger::ALL {
            // Joint above the tip: curled fingers read as down.
            lms[finger.pip()] = Landmark::new(x, y - 0.05, 0.0);
        }
        lms
    }

    /// A hand with only the given fingers raised, palm at (0.5, 0.5).
    pub fn fingers_up(up: &[Finger]) -> Vec<Landmark> {
        let mut lms = fist_at(0.5, 0.5);
        for finger in up {
            lms[finger.tip()] = Landmark::new(0.5, 0.3, 0.0);
        }
        lms
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_fist_when_tips_on_palm() {
        assert!(is_fist(&fist_at(0.4, 0.6), 0.1));
    }

    #[test]
    fn test_one_open_finger_breaks_fist() {
        for tip in index::FINGERTIPS {
            let mut lms = fist_at(0.4, 0.6);
            lms[tip].x += 0.5;
            assert!(!is_fist(&lms, 0.1), "tip {} moved away", tip);
        }
    }

    #[test]
    fn test_fist_needs_full_skeleton() {
        let lms: Vec<_> = fist_at(0.4, 0.6).into_iter().take(20).collect();
        assert!(!is_fist(&lms, 0.1));
        assert!(!is_fist(&[], 0.1));
    }

    #[test]
    fn test_finger_up_strict() {
        let mut lms = fist_at(0.5, 0.5);

        lms[index::INDEX_TIP].y = 0.3;
        lms[index::INDEX_PIP].y = 0.4;
        assert!(is_finger_up(&lms, Finger::Index));

        lms[index::INDEX_TIP].y = 0.4;
        assert!(!is_finger_up(&lms, Finger::Index), "equal is not up");

        lms[index::INDEX_TIP].y = 0.5;
        assert!(!is_finger_up(&lms, Finger::Index));
    }

    #[test]
    fn test_finger_up_missing_data() {
        let lms: Vec<_> = open_hand_at(0.5, 0.5, 0.1).into_iter().take(9).collect();
        let states = finger_states(&lms);
        assert!(states.index);
        assert!(!states.middle && !states.ring && !states.pinky);
    }

    #[test]
    fn test_single_raised() {
        let s = finger_states(&fingers_up(&[Finger::Ring]));
        assert_eq!(s.single_raised(), Some(Finger::Ring));

        let s = finger_states(&fingers_up(&[Finger::Ring, Finger::Index]));
        assert_eq!(s.single_raised(), None);
        assert_eq!(s.raised().collect::<Vec<_>>(), vec![Finger::Index, Finger::Ring]);

        assert_eq!(FingerStates::default().single_raised(), None);
    }

    #[test]
    fn test_pinch_strength_clamped() {
        assert_eq!(pinch_strength(0.1, 5.0), 0.5);
        assert_eq!(pinch_strength(0.5, 5.0), 1.0);
        assert_eq!(pinch_strength(0.0, 5.0), 0.0);
        assert_eq!(pinch_distance(&[]), 0.0);
    }

    #[test]
    fn test_height_and_mirror() {
        let vp = VideoViewport::full_frame();
        let lms = open_hand_at(0.2, 0.25, 0.1);
        assert!((normalized_height(&lms, index::PALM, &vp) - 0.75).abs() < 1e-6);
        assert!((normalized_horizontal(&lms, index::PALM, &vp, true) - 0.8).abs() < 1e-6);
        assert!((normalized_horizontal(&lms, index::PALM, &vp, false) - 0.2).abs() < 1e-6);
        assert_eq!(normalized_height(&[], index::PALM, &vp), 0.0);
    }

    #[test]
    fn test_classify_open_hand() {
        let reading = HandReading::classify(
            &open_hand_at(0.5, 0.5, 0.1),
            &VideoViewport::full_frame(),
            &GestureConfig::default(),
        );
        assert!(!reading.is_fist);
        assert_eq!(reading.fingers.raised_count(), 4);
        assert!((reading.pinch_strength - 0.5).abs() < 1e-5);
        assert!(!reading.secondary_pinch);
    }

    #[test]
    fn test_classify_degrades_on_short_input() {
        let reading = HandReading::classify(
            &[Landmark::default(); 3],
            &VideoViewport::full_frame(),
            &GestureConfig::default(),
        );
        assert!(!reading.is_fist);
        assert_eq!(reading.fingers, FingerStates::default());
        assert_eq!(reading.pinch_strength, 0.0);
    }
}
