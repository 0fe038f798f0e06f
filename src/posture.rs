//! Hand posture: finger extension and the coarse gesture the session reacts to.
//!
//! Landmarks follow the common 21-joint hand layout (wrist, then four joints
//! per digit from the palm outwards) in normalized image coordinates, where
//! `y` grows downwards.

use crate::types::Point;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_IP: usize = 3;
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

/// Wrist plus the four knuckles; their mean approximates the palm centroid.
const PALM_POINTS: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

/// (tip, proximal joint) for the four vertical digits.
const VERTICAL_DIGITS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale to pixels, rounding to the nearest pixel. Coordinates are held to
    /// within one frame of the visible area.
    fn to_pixels(self, width: usize, height: usize) -> Point {
        let scale = |v: f32, len: usize| (v.clamp(-1.0, 2.0) * len as f32).round() as i32;
        Point::new(scale(self.x, width), scale(self.y, height))
    }
}

/// One detected hand in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSnapshot {
    pub landmarks: [Landmark; LANDMARK_COUNT],
}

impl LandmarkSnapshot {
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { landmarks }
    }
}

/// `[thumb, index, middle, ring, pinky]`, `true` = extended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerVector(pub [bool; 5]);

impl FingerVector {
    #[cfg(test)]
    pub fn thumb(&self) -> bool {
        self.0[0]
    }
    pub fn index(&self) -> bool {
        self.0[1]
    }
    pub fn middle(&self) -> bool {
        self.0[2]
    }

    pub fn all_extended(&self) -> bool {
        self.0.iter().all(|&up| up)
    }

    pub fn gesture(&self) -> GestureLabel {
        if self.all_extended() {
            GestureLabel::PalmOpen
        } else if self.index() && !self.middle() {
            GestureLabel::Pointing
        } else {
            GestureLabel::Neutral
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureLabel {
    /// Index extended, middle retracted; the other digits don't matter.
    Pointing,
    /// All five digits extended.
    PalmOpen,
    Neutral,
}

/// Finger extension for one snapshot, or all-retracted when there is no hand.
///
/// Vertical digits are extended when the tip sits above (smaller row than) the
/// PIP joint. The thumb moves sideways, so it compares columns instead: tip left
/// of the IP joint counts as extended. That assumes a right hand seen in a
/// mirrored (selfie) frame; a left hand or an unmirrored feed reads inverted.
pub fn finger_vector(hand: Option<&LandmarkSnapshot>) -> FingerVector {
    let Some(hand) = hand else {
        return FingerVector::default();
    };
    let lm = &hand.landmarks;
    let mut up = [false; 5];
    up[0] = lm[THUMB_TIP].x < lm[THUMB_IP].x;
    for (slot, (tip, pip)) in up[1..].iter_mut().zip(VERTICAL_DIGITS) {
        *slot = lm[tip].y < lm[pip].y;
    }
    FingerVector(up)
}

/// Stateless: no history, no hysteresis.
pub fn classify(hand: Option<&LandmarkSnapshot>) -> (FingerVector, GestureLabel) {
    let fingers = finger_vector(hand);
    (fingers, fingers.gesture())
}

/// Index fingertip in pixel coordinates.
pub fn fingertip_position(hand: Option<&LandmarkSnapshot>, width: usize, height: usize) -> Option<Point> {
    hand.map(|h| h.landmarks[INDEX_TIP].to_pixels(width, height))
}

/// Mean of wrist and knuckle positions, each scaled to pixels first.
pub fn palm_center(hand: Option<&LandmarkSnapshot>, width: usize, height: usize) -> Option<Point> {
    let hand = hand?;
    let (sx, sy) = PALM_POINTS.iter().fold((0i32, 0i32), |(sx, sy), &i| {
        let p = hand.landmarks[i].to_pixels(width, height);
        (sx + p.x, sy + p.y)
    });
    let n = PALM_POINTS.len() as f32;
    Some(Point::new((sx as f32 / n).round() as i32, (sy as f32 / n).round() as i32))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a hand from pixel positions on a `w`x`h` frame.
    pub(crate) fn hand_from_pixels(offsets: &[(i32, i32); LANDMARK_COUNT], w: f32, h: f32) -> LandmarkSnapshot {
        let mut lm = [Landmark::default(); LANDMARK_COUNT];
        for (slot, &(x, y)) in lm.iter_mut().zip(offsets) {
            *slot = Landmark::new(x as f32 / w, y as f32 / h);
        }
        LandmarkSnapshot::new(lm)
    }

    /// Set tip/pip rows so each digit reads as requested.
    pub(crate) fn hand_with(fingers: [bool; 5]) -> LandmarkSnapshot {
        let mut lm = [Landmark::new(0.5, 0.5); LANDMARK_COUNT];
        lm[THUMB_IP] = Landmark::new(0.4, 0.5);
        lm[THUMB_TIP] = Landmark::new(if fingers[0] { 0.3 } else { 0.45 }, 0.5);
        for (up, (tip, pip)) in fingers[1..].iter().zip(VERTICAL_DIGITS) {
            lm[pip] = Landmark::new(0.5, 0.5);
            lm[tip] = Landmark::new(0.5, if *up { 0.3 } else { 0.6 });
        }
        LandmarkSnapshot::new(lm)
    }

    #[test]
    fn no_hand_is_neutral() {
        assert_eq!(classify(None), (FingerVector([false; 5]), GestureLabel::Neutral));
        assert_eq!(fingertip_position(None, 640, 480), None);
        assert_eq!(palm_center(None, 640, 480), None);
    }

    #[test]
    fn reads_each_digit() {
        for mask in 0u8..32 {
            let fingers: [bool; 5] = std::array::from_fn(|i| mask & (1 << i) != 0);
            let (v, _) = classify(Some(&hand_with(fingers)));
            assert_eq!(v.0, fingers);
        }
    }

    #[test]
    fn gesture_labels_over_every_combination() {
        for mask in 0u8..32 {
            let v = FingerVector(std::array::from_fn(|i| mask & (1 << i) != 0));
            let label = v.gesture();
            assert_eq!(label == GestureLabel::PalmOpen, v.0.iter().all(|&b| b));
            if !v.all_extended() {
                assert_eq!(label == GestureLabel::Pointing, v.index() && !v.middle());
            }
        }
    }

    #[test]
    fn pointing_ignores_thumb_ring_and_pinky() {
        for other in [[false, false, false], [true, true, true], [true, false, true]] {
            let fingers = [other[0], true, false, other[1], other[2]];
            assert_eq!(classify(Some(&hand_with(fingers))).1, GestureLabel::Pointing);
        }
    }

    #[test]
    fn thumb_uses_horizontal_comparison() {
        let mut hand = hand_with([false, true, true, true, true]);
        // tip far above the IP joint but to its right: still retracted
        hand.landmarks[THUMB_TIP] = Landmark::new(0.45, 0.1);
        assert!(!finger_vector(Some(&hand)).thumb());
        hand.landmarks[THUMB_TIP] = Landmark::new(0.35, 0.9);
        assert!(finger_vector(Some(&hand)).thumb());
        assert_eq!(classify(Some(&hand)).1, GestureLabel::PalmOpen);
    }

    #[test]
    fn far_off_frame_joints_stay_near_the_frame() {
        let mut hand = hand_with([true, true, false, false, false]);
        for lm in hand.landmarks.iter_mut() {
            lm.x = 1.0e7;
        }
        hand.landmarks[WRIST].y = -1.0e9;
        assert_eq!(fingertip_position(Some(&hand), 640, 480).map(|p| p.x), Some(1280));
        let center = palm_center(Some(&hand), 640, 480).unwrap();
        assert_eq!(center.x, 1280);
        assert!(center.y >= -480);
    }

    #[test]
    fn scales_fingertip_and_palm_to_pixels() {
        let mut hand = hand_with([false; 5]);
        hand.landmarks[INDEX_TIP] = Landmark::new(0.25, 0.5);
        assert_eq!(fingertip_position(Some(&hand), 640, 480), Some(Point::new(160, 240)));

        let mut offsets = [(0, 0); LANDMARK_COUNT];
        offsets[WRIST] = (200, 250);
        offsets[INDEX_MCP] = (170, 188);
        offsets[MIDDLE_MCP] = (190, 186);
        offsets[RING_MCP] = (210, 188);
        offsets[PINKY_MCP] = (230, 188);
        let hand = hand_from_pixels(&offsets, 640.0, 480.0);
        assert_eq!(palm_center(Some(&hand), 640, 480), Some(Point::new(200, 200)));
    }
}
