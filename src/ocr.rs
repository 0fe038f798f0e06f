// Handwriting recognition on a saved drawing.
// The canvas is cleaned up into a high-contrast binary image, then handed to an
// external OCR engine restricted to Latin letters.

use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::{GrayImage, ImageFormat, Luma, RgbImage, imageops::FilterType};

use crate::config::OcrConfig;
use crate::error::Error;

/// Turns a rasterized drawing into text. Empty string = nothing recognized.
pub trait Recognizer {
    fn recognize(&mut self, image: &RgbImage) -> Result<String, Error>;
}

/// Runs the `tesseract` executable, feeding the image over stdin.
pub struct TesseractCli {
    config: OcrConfig,
}

impl TesseractCli {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

impl Recognizer for TesseractCli {
    fn recognize(&mut self, image: &RgbImage) -> Result<String, Error> {
        let prepared = preprocess(image);
        let mut png = Vec::new();
        prepared
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::Recognize(format!("encode: {e}")))?;

        let mut child = Command::new(&self.config.command)
            .arg("stdin")
            .arg("stdout")
            .args(["--oem", &self.config.engine_mode.to_string()])
            .args(["--psm", &self.config.page_segmentation.to_string()])
            .args(["-c", &format!("tessedit_char_whitelist={}", self.config.whitelist)])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Recognize(format!("spawn `{}`: {e}", self.config.command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png)
                .map_err(|e| Error::Recognize(format!("write image: {e}")))?;
        }
        let out = child
            .wait_with_output()
            .map_err(|e| Error::Recognize(format!("wait: {e}")))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(Error::Recognize(format!("{} ({})", stderr.trim(), out.status)));
        }
        Ok(collapse_whitespace(&String::from_utf8_lossy(&out.stdout)))
    }
}

/// Runs of whitespace become one space; leading/trailing whitespace goes.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Grayscale, invert, Otsu threshold, 3x3 median, 2x2 dilate, 2x upscale.
pub fn preprocess(image: &RgbImage) -> GrayImage {
    let mut gray = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let l = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([255 - l.round().clamp(0.0, 255.0) as u8])
    });

    let t = otsu_threshold(&gray);
    for p in gray.pixels_mut() {
        p.0[0] = if p.0[0] > t { 255 } else { 0 };
    }

    let cleaned = dilate_2x2(&median_3x3(&gray));
    image::imageops::resize(&cleaned, cleaned.width() * 2, cleaned.height() * 2, FilterType::Triangle)
}

/// Threshold that maximizes between-class variance of the histogram.
pub fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut hist = [0u64; 256];
    for p in img.pixels() {
        hist[p.0[0] as usize] += 1;
    }
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }
    let sum_all: f64 = hist.iter().enumerate().map(|(i, &c)| i as f64 * c as f64).sum();

    let (mut w_bg, mut sum_bg) = (0u64, 0f64);
    let (mut best_t, mut best_var) = (0u8, -1f64);
    for t in 0..256 {
        w_bg += hist[t];
        if w_bg == 0 {
            continue;
        }
        let w_fg = total - w_bg;
        if w_fg == 0 {
            break;
        }
        sum_bg += t as f64 * hist[t] as f64;
        let m_bg = sum_bg / w_bg as f64;
        let m_fg = (sum_all - sum_bg) / w_fg as f64;
        let var = w_bg as f64 * w_fg as f64 * (m_bg - m_fg).powi(2);
        if var > best_var {
            best_var = var;
            best_t = t as u8;
        }
    }
    best_t
}

/// 3x3 median with replicated borders.
fn median_3x3(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    let at = |x: i64, y: i64| {
        let x = x.clamp(0, w as i64 - 1) as u32;
        let y = y.clamp(0, h as i64 - 1) as u32;
        img.get_pixel(x, y).0[0]
    };
    GrayImage::from_fn(w, h, |x, y| {
        let mut window = [0u8; 9];
        let mut i = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                window[i] = at(x as i64 + dx, y as i64 + dy);
                i += 1;
            }
        }
        window.sort_unstable();
        Luma([window[4]])
    })
}

/// Max over the pixel and its left/up neighbours.
fn dilate_2x2(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        let mut m = img.get_pixel(x, y).0[0];
        for (dx, dy) in [(1, 0), (0, 1), (1, 1)] {
            if x >= dx && y >= dy {
                m = m.max(img.get_pixel(x - dx, y - dy).0[0]);
            }
        }
        Luma([m])
    })
}
