// src/smoother.rs

use crate::landmark::Landmark;

/// Default smoothing factor. Smaller = more smoothing.
pub const DEFAULT_ALPHA: f32 = 0.4;

/// Exponential moving average over one hand slot's landmarks.
///
/// The first sample after creation, after a length change, or after the
/// hand was lost seeds the state directly, so a hand entering the frame
/// shows up where it is instead of drifting in.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    alpha: f32,
    state: Option<Vec<Landmark>>,
    /// Set while the slot has no hand; the next sample reseeds.
    stale: bool,
}

impl LandmarkSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::MIN_POSITIVE, 1.0),
            state: None,
            stale: false,
        }
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Feed one raw sample and return the smoothed set.
    pub fn smooth(&mut self, raw: &[Landmark]) -> &[Landmark] {
        let alpha = self.alpha;

        match &mut self.state {
            Some(prev) if !self.stale && prev.len() == raw.len() => {
                for (s, r) in prev.iter_mut().zip(raw) {
                    s.x = alpha * r.x + (1.0 - alpha) * s.x;
                    s.y = alpha * r.y + (1.0 - alpha) * s.y;
                    s.z = alpha * r.z + (1.0 - alpha) * s.z;
                }
            }
            slot => {
                *slot = Some(raw.to_vec());
            }
        }

        self.stale = false;
        self.state.as_deref().unwrap_or(&[])
    }

    /// The hand left the frame. Keeps the last values, reseeds on return.
    pub fn mark_absent(&mut self) {
        self.stale = true;
    }

    /// Last smoothed set, if any sample was ever seen.
    pub fn last(&self) -> Option<&[Landmark]> {
        self.state.as_deref()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hand(offset: f32) -> Vec<Landmark> {
        (0..21)
            .map(|i| Landmark::new(offset + i as f32 * 0.01, offset, -offset))
            .collect()
    }

    #[test]
    fn test_first_sample_seeds() {
        let mut s = LandmarkSmoother::new(0.4);
        let raw = hand(0.3);
        assert_eq!(s.smooth(&raw), raw.as_slice());
    }

    #[test]
    fn test_second_sample_blends() {
        let mut s = LandmarkSmoother::new(0.4);
        s.smooth(&hand(0.0));
        let out = s.smooth(&hand(1.0)).to_vec();
        assert!((out[0].y - 0.4).abs() < 1e-6);
        assert!((out[0].z + 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_length_change_reseeds() {
        let mut s = LandmarkSmoother::new(0.4);
        s.smooth(&hand(0.0));
        let short: Vec<_> = hand(0.8).into_iter().take(5).collect();
        assert_eq!(s.smooth(&short), short.as_slice());
    }

    #[test]
    fn test_reappearance_reseeds() {
        let mut s = LandmarkSmoother::new(0.4);
        s.smooth(&hand(0.0));
        s.mark_absent();
        assert!(s.is_stale());
        assert!(s.last().is_some());

        let raw = hand(0.9);
        assert_eq!(s.smooth(&raw), raw.as_slice());
        assert!(!s.is_stale());
    }

    #[test]
    fn test_alpha_one_tracks_raw() {
        let mut s = LandmarkSmoother::new(1.0);
        s.smooth(&hand(0.0));
        let raw = hand(0.5);
        assert_eq!(s.smooth(&raw), raw.as_slice());
    }

    proptest! {
        #[test]
        fn recurrence_holds_per_coordinate(
            alpha in 0.01f32..=1.0,
            samples in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0, -1.0f32..1.0), 2..12),
        ) {
            let mut s = LandmarkSmoother::new(alpha);
            let mut expected: Option<Landmark> = None;

            for (x, y, z) in samples {
                let raw = [Landmark::new(x, y, z)];
                let out = s.smooth(&raw)[0];

                let want = match expected {
                    None => raw[0],
                    Some(p) => Landmark::new(
                        alpha * x + (1.0 - alpha) * p.x,
                        alpha * y + (1.0 - alpha) * p.y,
                        alpha * z + (1.0 - alpha) * p.z,
                    ),
                };
                prop_assert_eq!(out, want);
                expected = Some(out);
            }
        }
    }
}
