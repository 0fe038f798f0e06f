// The drawing surface: a persistent RGB buffer the size of the camera frame,
// the pen, and whether the next segment continues the previous stroke.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{ImageBuffer, Rgb, RgbImage};
use serde::Deserialize;

use crate::draw::{draw_line_aa, fill_disc_aa};
use crate::error::Error;
use crate::types::{FrameBuffer, Point, channels, rgb};

pub const BACKGROUND: u32 = 0x00_FF_FF_FF; // white paper
pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.35;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenColor {
    Black,
    Red,
    Green,
    Blue,
    Purple,
    Orange,
}

impl PenColor {
    pub const ALL: [PenColor; 6] = [
        PenColor::Black,
        PenColor::Red,
        PenColor::Green,
        PenColor::Blue,
        PenColor::Purple,
        PenColor::Orange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PenColor::Black => "black",
            PenColor::Red => "red",
            PenColor::Green => "green",
            PenColor::Blue => "blue",
            PenColor::Purple => "purple",
            PenColor::Orange => "orange",
        }
    }

    /// Packed 0x00RRGGBB.
    pub fn rgb(self) -> u32 {
        match self {
            PenColor::Black => rgb(0, 0, 0),
            PenColor::Red => rgb(255, 0, 0),
            PenColor::Green => rgb(0, 255, 0),
            PenColor::Blue => rgb(0, 0, 255),
            PenColor::Purple => rgb(255, 0, 255),
            PenColor::Orange => rgb(255, 165, 0),
        }
    }
}

impl FromStr for PenColor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        PenColor::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PenStyle {
    pub color: PenColor,
    pub thickness: i32,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self { color: PenColor::Blue, thickness: 6 }
    }
}

pub struct CanvasSurface {
    buffer: FrameBuffer,
    previous: Option<Point>,
    pen: PenStyle,
}

impl CanvasSurface {
    pub fn new(width: usize, height: usize, pen: PenStyle) -> Self {
        Self { buffer: FrameBuffer::filled(width, height, BACKGROUND), previous: None, pen }
    }

    pub fn width(&self) -> usize {
        self.buffer.width
    }

    pub fn height(&self) -> usize {
        self.buffer.height
    }

    #[cfg(test)]
    pub fn pixels(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Where the current stroke left off, if one is in progress.
    pub fn previous_point(&self) -> Option<Point> {
        self.previous
    }

    pub fn pen(&self) -> PenStyle {
        self.pen
    }

    /// Switch pen color by palette name; unknown names leave the pen alone.
    pub fn set_color(&mut self, name: &str) -> bool {
        match name.parse::<PenColor>() {
            Ok(color) => {
                self.pen.color = color;
                true
            }
            Err(()) => false,
        }
    }

    /// Connect `from` to `to` with the current pen. With either end missing
    /// nothing is drawn; `to` just becomes the start of the next segment.
    pub fn draw_segment(&mut self, from: Option<Point>, to: Option<Point>) {
        if let (Some(a), Some(b)) = (from, to) {
            draw_line_aa(&mut self.buffer, a, b, self.pen.thickness, self.pen.color.rgb());
        }
        self.previous = to;
    }

    /// Paint a background-colored disc. Leaves stroke continuity alone.
    pub fn erase_at(&mut self, center: Option<Point>, radius: i32) {
        if let Some(c) = center {
            fill_disc_aa(&mut self.buffer, c, radius, BACKGROUND);
        }
    }

    pub fn reset_continuity(&mut self) {
        self.previous = None;
    }

    /// Back to blank paper. Pen and stroke state are untouched.
    pub fn clear(&mut self) {
        self.buffer.pixels.fill(BACKGROUND);
    }

    /// `frame + alpha * canvas` per channel, saturating. The canvas is only read.
    pub fn overlay(&self, frame: &FrameBuffer, alpha: f32) -> Result<FrameBuffer, Error> {
        if frame.width != self.buffer.width || frame.height != self.buffer.height {
            return Err(Error::CameraFrame(format!(
                "overlay: frame is {}x{}, canvas is {}x{}",
                frame.width, frame.height, self.buffer.width, self.buffer.height
            )));
        }
        let add = |f: u8, c: u8| (f as f32 + alpha * c as f32).round().min(255.0) as u8;
        let pixels = frame
            .pixels
            .iter()
            .zip(&self.buffer.pixels)
            .map(|(&f, &c)| {
                let (fr, fg, fb) = channels(f);
                let (cr, cg, cb) = channels(c);
                rgb(add(fr, cr), add(fg, cg), add(fb, cb))
            })
            .collect();
        Ok(FrameBuffer { width: frame.width, height: frame.height, pixels })
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let (w, h) = (self.buffer.width as u32, self.buffer.height as u32);
        ImageBuffer::from_fn(w, h, |x, y| {
            let (r, g, b) = channels(self.buffer.pixels[(y * w + x) as usize]);
            Rgb([r, g, b])
        })
    }

    /// Write the canvas as `drawing_<unix seconds>.png` under `dir`, creating it if needed.
    /// A numeric suffix keeps two saves within the same second apart.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf, Error> {
        fs::create_dir_all(dir)
            .map_err(|e| Error::Persist { path: dir.to_path_buf(), reason: e.to_string() })?;

        let secs = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        let mut path = dir.join(format!("drawing_{secs}.png"));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("drawing_{secs}_{n}.png"));
            n += 1;
        }

        self.to_rgb_image()
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| Error::Persist { path: path.clone(), reason: e.to_string() })?;
        Ok(path)
    }
}
