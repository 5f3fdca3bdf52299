// src/landmark.rs
//
// Hand skeleton primitives shared by the whole gesture pipeline.

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;

/// Number of landmarks the detector reports per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices of the standard 21-point hand skeleton.
pub mod index {
    pub const WRIST: usize = 0;

    pub const THUMB_TIP: usize = 4;

    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;

    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;

    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;

    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;

    /// Middle-finger MCP stands in for the palm center.
    pub const PALM: usize = MIDDLE_MCP;

    /// Fingertips, thumb first.
    pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
}

/// One tracked skeletal point.
///
/// `x` and `y` are normalized to the video frame (y grows downward),
/// `z` is relative depth and unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in the image plane, ignoring depth.
    #[inline]
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Build a landmark list from a flat `[x0, y0, z0, x1, ...]` buffer.
///
/// Trailing values that do not form a full triple are rejected.
pub fn landmarks_from_flat(coords: &[f32]) -> Result<Vec<Landmark>, DetectorError> {
    if coords.len() % 3 != 0 {
        return Err(DetectorError::Malformed(format!(
            "{} values is not a multiple of 3",
            coords.len()
        )));
    }

    Ok(coords
        .chunks_exact(3)
        .map(|c| Landmark::new(c[0], c[1], c[2]))
        .collect())
}

/// Left/right label reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    /// Parse the detector's category label ("Left" / "Right").
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "left" => Handedness::Left,
            "right" => Handedness::Right,
            _ => Handedness::Unknown,
        }
    }
}

/// One hand as reported by the detector for a single video frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectedHand {
    pub landmarks: Vec<Landmark>,
    pub handedness: Handedness,
}

impl DetectedHand {
    pub fn new(landmarks: Vec<Landmark>, handedness: Handedness) -> Self {
        Self {
            landmarks,
            handedness,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Video viewport
// ═══════════════════════════════════════════════════════════════════

/// The part of the camera frame that is actually visible on screen.
///
/// The video is scaled to cover the render area, so one axis gets
/// cropped. Landmarks are normalized to the full frame; this maps them
/// to the visible region so that "top of the screen" really means the
/// top of what the user sees. All values are in video pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoViewport {
    pub offset_x: f32,
    pub offset_y: f32,
    pub visible_width: f32,
    pub visible_height: f32,
    pub video_width: f32,
    pub video_height: f32,
}

impl VideoViewport {
    /// Viewport with no cropping; normalized coordinates pass through.
    pub fn full_frame() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            visible_width: 1.0,
            visible_height: 1.0,
            video_width: 1.0,
            video_height: 1.0,
        }
    }

    /// Compute the cover-crop viewport for a video shown in a render area.
    ///
    /// Returns `None` while any dimension is still zero (metadata not
    /// loaded, element hidden).
    pub fn cover(video_width: f32, video_height: f32, render_width: f32, render_height: f32) -> Option<Self> {
        if video_width <= 0.0 || video_height <= 0.0 || render_width <= 0.0 || render_height <= 0.0 {
            return None;
        }

        let video_aspect = video_width / video_height;
        let render_aspect = render_width / render_height;

        let (offset_x, offset_y, visible_width, visible_height) = if video_aspect > render_aspect {
            // Wider than the render area: fit height, crop left and right.
            let scale = render_height / video_height;
            let cropped = (video_width * scale - render_width) / scale;
            (cropped / 2.0, 0.0, video_width - cropped, video_height)
        } else {
            // Taller (or equal): fit width, crop top and bottom.
            let scale = render_width / video_width;
            let cropped = (video_height * scale - render_height) / scale;
            (0.0, cropped / 2.0, video_width, video_height - cropped)
        };

        if visible_width <= 0.0 || visible_height <= 0.0 {
            log::warn!(
                "degenerate viewport ({}x{} visible), falling back to full frame",
                visible_width,
                visible_height
            );
            return Some(Self {
                offset_x: 0.0,
                offset_y: 0.0,
                visible_width: video_width,
                visible_height: video_height,
                video_width,
                video_height,
            });
        }

        Some(Self {
            offset_x,
            offset_y,
            visible_width,
            visible_height,
            video_width,
            video_height,
        })
    }

    /// Map a frame-normalized landmark to visible-region-normalized (x, y).
    ///
    /// Points in the cropped margin fall outside [0, 1].
    #[inline]
    pub fn to_visible(&self, lm: &Landmark) -> (f32, f32) {
        let px = lm.x * self.video_width;
        let py = lm.y * self.video_height;
        (
            (px - self.offset_x) / self.visible_width,
            (py - self.offset_y) / self.visible_height,
        )
    }
}

impl Default for VideoViewport {
    fn default() -> Self {
        Self::full_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance_ignores_depth() {
        let a = Landmark::new(0.0, 0.0, 5.0);
        let b = Landmark::new(0.3, 0.4, -5.0);
        assert!((a.planar_distance(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_flat() {
        let lms = landmarks_from_flat(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        assert_eq!(lms.len(), 2);
        assert_eq!(lms[1], Landmark::new(0.4, 0.5, 0.6));

        assert!(landmarks_from_flat(&[0.1, 0.2]).is_err());
    }

    #[test]
    fn test_handedness_label() {
        assert_eq!(Handedness::from_label("Left"), Handedness::Left);
        assert_eq!(Handedness::from_label(" right "), Handedness::Right);
        assert_eq!(Handedness::from_label("?"), Handedness::Unknown);
    }

    #[test]
    fn test_cover_crops_wide_video() {
        // 16:9 video in a square render area: crop horizontally.
        let vp = VideoViewport::cover(1280.0, 720.0, 500.0, 500.0).unwrap();
        assert_eq!(vp.offset_y, 0.0);
        assert!((vp.visible_width - 720.0).abs() < 1e-3);
        assert!((vp.offset_x - 280.0).abs() < 1e-3);

        // Frame center stays centered.
        let (x, y) = vp.to_visible(&Landmark::new(0.5, 0.5, 0.0));
        assert!((x - 0.5).abs() < 1e-6);
        assert!((y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cover_crops_tall_video() {
        let vp = VideoViewport::cover(720.0, 1280.0, 500.0, 500.0).unwrap();
        assert_eq!(vp.offset_x, 0.0);
        assert!((vp.visible_height - 720.0).abs() < 1e-3);
    }

    #[test]
    fn test_cover_requires_dimensions() {
        assert!(VideoViewport::cover(0.0, 720.0, 500.0, 500.0).is_none());
        assert!(VideoViewport::cover(1280.0, 720.0, 500.0, 0.0).is_none());
    }

    #[test]
    fn test_full_frame_is_identity() {
        let vp = VideoViewport::full_frame();
        let (x, y) = vp.to_visible(&Landmark::new(0.25, 0.75, 0.0));
        assert_eq!((x, y), (0.25, 0.75));
    }
}
