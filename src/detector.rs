//! Hand-landmark sources.
//!
//! The landmark model itself lives outside this program. Anything that can turn
//! a frame into at most one [`LandmarkSnapshot`] plugs in through [`HandDetector`]:
//! a recorded or piped stream from an external tracker, or a synthetic hand
//! steered with the mouse for working without one.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::draw::Pointer;
use crate::error::Error;
use crate::posture::{LANDMARK_COUNT, Landmark, LandmarkSnapshot};
use crate::types::{FrameBuffer, Point};

/// Best effort, one frame at a time, no tracking guarantees. `Ok(None)` = no hand.
pub trait HandDetector {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<LandmarkSnapshot>, Error>;
}

#[derive(Deserialize)]
struct HandLine {
    landmarks: Vec<JointLine>,
}

#[derive(Deserialize)]
struct JointLine {
    x: f32,
    y: f32,
}

/// Normalized coordinates a tracker may report for a hand partly off frame.
const JOINT_RANGE: std::ops::RangeInclusive<f32> = -1.0..=2.0;

/// Newline-delimited JSON, one line per frame: `null`, or
/// `{"landmarks": [{"x": .., "y": .., "z": ..}, ...]}` with 21 joints normalized to the frame.
/// Depth is ignored. A joint outside `JOINT_RANGE` makes the whole line unusable.
pub struct LandmarkStream<R> {
    reader: R,
    line: String,
    frame_no: u64,
    ended: bool,
}

impl LandmarkStream<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)
            .map_err(|e| Error::Detector(format!("open {}: {e}", path.display())))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LandmarkStream<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: String::new(), frame_no: 0, ended: false }
    }

    fn parse(&self) -> Option<LandmarkSnapshot> {
        let text = self.line.trim();
        if text.is_empty() {
            return None;
        }
        let hand: Option<HandLine> = match serde_json::from_str(text) {
            Ok(hand) => hand,
            Err(e) => {
                log::warn!("landmark line {}: {e}", self.frame_no);
                return None;
            }
        };
        let hand = hand?;
        if hand.landmarks.len() != LANDMARK_COUNT {
            log::warn!(
                "landmark line {}: expected {LANDMARK_COUNT} joints, got {}",
                self.frame_no,
                hand.landmarks.len()
            );
            return None;
        }
        if let Some(i) = hand
            .landmarks
            .iter()
            .position(|j| !JOINT_RANGE.contains(&j.x) || !JOINT_RANGE.contains(&j.y))
        {
            log::warn!("landmark line {}: joint {i} out of range", self.frame_no);
            return None;
        }
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (slot, j) in landmarks.iter_mut().zip(&hand.landmarks) {
            *slot = Landmark::new(j.x, j.y);
        }
        Some(LandmarkSnapshot::new(landmarks))
    }
}

impl<R: BufRead> HandDetector for LandmarkStream<R> {
    fn detect(&mut self, _frame: &FrameBuffer) -> Result<Option<LandmarkSnapshot>, Error> {
        if self.ended {
            return Ok(None);
        }
        self.line.clear();
        let n = self
            .reader
            .read_line(&mut self.line)
            .map_err(|e| Error::Detector(format!("read landmarks: {e}")))?;
        if n == 0 {
            log::warn!("landmark stream ended after {} frames", self.frame_no);
            self.ended = true;
            return Ok(None);
        }
        self.frame_no += 1;
        Ok(self.parse())
    }
}

// Pixel offsets of the 21 joints around the palm centroid for a right hand in a
// mirrored view (thumb pointing to screen-left).

const PALM_OPEN: [(i32, i32); LANDMARK_COUNT] = [
    (0, 50),
    (-20, 35), (-35, 20), (-45, 5), (-58, -5),
    (-30, -12), (-32, -40), (-33, -55), (-34, -70),
    (-10, -14), (-10, -45), (-10, -62), (-10, -78),
    (10, -12), (11, -42), (12, -58), (13, -72),
    (30, -12), (33, -35), (35, -47), (37, -58),
];

const POINTING: [(i32, i32); LANDMARK_COUNT] = [
    (0, 50),
    (-20, 35), (-25, 20), (-30, 10), (-18, 0),
    (-30, -12), (-32, -40), (-33, -55), (-34, -70),
    (-10, -14), (-10, -35), (-10, -22), (-10, -15),
    (10, -12), (11, -32), (11, -20), (11, -14),
    (30, -12), (33, -28), (33, -18), (33, -13),
];

const FIST: [(i32, i32); LANDMARK_COUNT] = [
    (0, 50),
    (-20, 35), (-25, 20), (-30, 10), (-18, 0),
    (-30, -12), (-32, -35), (-32, -22), (-32, -15),
    (-10, -14), (-10, -35), (-10, -22), (-10, -15),
    (10, -12), (11, -32), (11, -20), (11, -14),
    (30, -12), (33, -28), (33, -18), (33, -13),
];

/// Mouse-driven stand-in for a tracker. Left button: pointing with the index tip
/// on the cursor. Right button: open palm centered on the cursor. Neither: a
/// closed hand whose index tip still follows the cursor, so buttons can be hovered.
#[derive(Default)]
pub struct PointerHand {
    pointer: Option<Pointer>,
}

impl PointerHand {
    /// Feed this frame's mouse state before calling `detect`.
    pub fn update(&mut self, pointer: Option<Pointer>) {
        self.pointer = pointer;
    }
}

impl HandDetector for PointerHand {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<LandmarkSnapshot>, Error> {
        Ok(self.pointer.map(|p| synthesize_hand(p, frame.width, frame.height)))
    }
}

pub fn synthesize_hand(pointer: Pointer, width: usize, height: usize) -> LandmarkSnapshot {
    let (pose, center) = if pointer.right {
        (&PALM_OPEN, pointer.pos)
    } else {
        let pose = if pointer.left { &POINTING } else { &FIST };
        // put the index tip on the cursor
        let (tx, ty) = pose[crate::posture::INDEX_TIP];
        (pose, Point::new(pointer.pos.x - tx, pointer.pos.y - ty))
    };
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
    for (slot, &(dx, dy)) in landmarks.iter_mut().zip(pose) {
        *slot = Landmark::new((center.x + dx) as f32 / w, (center.y + dy) as f32 / h);
    }
    LandmarkSnapshot::new(landmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posture::{GestureLabel, classify, fingertip_position, palm_center};
    use std::io::Cursor;

    fn joints(n: usize) -> String {
        let js: Vec<String> = (0..n).map(|i| format!(r#"{{"x":0.5,"y":{},"z":0.0}}"#, i as f32 / 100.0)).collect();
        format!(r#"{{"landmarks":[{}]}}"#, js.join(","))
    }

    #[test]
    fn stream_yields_one_snapshot_per_line() {
        let data = format!("{}\nnull\n\n{}\nnot json\n", joints(21), joints(5));
        let mut stream = LandmarkStream::new(Cursor::new(data));
        let frame = FrameBuffer::filled(4, 4, 0);

        let first = stream.detect(&frame).unwrap().expect("hand on first line");
        assert_eq!(first.landmarks[20], Landmark::new(0.5, 0.2));
        assert!(stream.detect(&frame).unwrap().is_none()); // null
        assert!(stream.detect(&frame).unwrap().is_none()); // blank
        assert!(stream.detect(&frame).unwrap().is_none()); // wrong joint count
        assert!(stream.detect(&frame).unwrap().is_none()); // garbage
        assert!(stream.detect(&frame).unwrap().is_none()); // eof
        assert!(stream.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn stream_rejects_out_of_range_joints() {
        let far = joints(21).replacen(r#""x":0.5"#, r#""x":10000000.0"#, 1);
        let behind = joints(21).replace(r#""y":0.2,"#, r#""y":-3.0,"#);
        let data = format!("{far}\n{behind}\n{}\n", joints(21));
        let mut stream = LandmarkStream::new(Cursor::new(data));
        let frame = FrameBuffer::filled(4, 4, 0);

        assert!(stream.detect(&frame).unwrap().is_none());
        assert!(stream.detect(&frame).unwrap().is_none());
        assert!(stream.detect(&frame).unwrap().is_some());
    }

    #[test]
    fn pointer_hand_poses_classify_as_intended() {
        let (w, h) = (640, 480);
        let at = Point::new(320, 240);
        let pose = |left, right| synthesize_hand(Pointer { pos: at, left, right }, w, h);

        let pointing = pose(true, false);
        assert_eq!(classify(Some(&pointing)).1, GestureLabel::Pointing);
        assert_eq!(fingertip_position(Some(&pointing), w, h), Some(at));

        let palm = pose(false, true);
        assert_eq!(classify(Some(&palm)).1, GestureLabel::PalmOpen);
        assert_eq!(palm_center(Some(&palm), w, h), Some(at));

        let fist = pose(false, false);
        assert_eq!(classify(Some(&fist)).1, GestureLabel::Neutral);
        assert_eq!(fingertip_position(Some(&fist), w, h), Some(at));
    }

    #[test]
    fn pointer_hand_without_cursor_sees_nothing() {
        let mut hand = PointerHand::default();
        let frame = FrameBuffer::filled(64, 48, 0);
        assert!(hand.detect(&frame).unwrap().is_none());
        hand.update(Some(Pointer { pos: Point::new(10, 10), left: true, right: false }));
        assert!(hand.detect(&frame).unwrap().is_some());
    }
}
