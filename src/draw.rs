// Window + software drawing utilities.
// Provided here:
// 1) A window that shows the composed camera + canvas image and reports keys/mouse.
// 2) Raster primitives: anti-aliased thick lines and discs, rectangles, a fingertip marker.
// 3) A tiny 5x7 bitmap font to render button labels and the status line.

use crate::error::Error;
use crate::types::{FrameBuffer, Point, channels, rgb};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

/// Mouse state sampled once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pointer {
    pub pos: Point,
    pub left: bool,
    pub right: bool,
}

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Create a window sized to the camera feed.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        // The loop is paced by the camera; don't add a second limiter on top.
        window.set_target_fps(0);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True while ESC is held down (we exit when this is pressed).
    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// C clears the canvas and the last recognized text.
    pub fn c_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::C, KeyRepeat::No)
    }

    /// Mouse position and buttons, or None when the cursor is outside the window.
    pub fn pointer(&self) -> Option<Pointer> {
        let (x, y) = self.window.get_mouse_pos(MouseMode::Discard)?;
        Some(Pointer {
            pos: Point::new(x as i32, y as i32),
            left: self.window.get_mouse_down(MouseButton::Left),
            right: self.window.get_mouse_down(MouseButton::Right),
        })
    }
}

/* ---------- Software drawing ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
pub fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Mix `color` into the pixel at (x,y) by `coverage` in [0,1].
#[inline]
fn blend_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32, coverage: f32) {
    if coverage <= 0.0 {
        return;
    }
    if coverage >= 1.0 {
        put_pixel(fb, x, y, color);
        return;
    }
    let Some(old) = fb.get(x, y) else { return };
    let (or, og, ob) = channels(old);
    let (cr, cg, cb) = channels(color);
    let mix = |o: u8, c: u8| (o as f32 + (c as f32 - o as f32) * coverage).round() as u8;
    put_pixel(fb, x, y, rgb(mix(or, cr), mix(og, cg), mix(ob, cb)));
}

/// Distance from (px,py) to the segment a-b.
fn distance_to_segment(px: f32, py: f32, a: Point, b: Point) -> f32 {
    let (ax, ay, bx, by) = (a.x as f32, a.y as f32, b.x as f32, b.y as f32);
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 { 0.0 } else { (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0) };
    let (qx, qy) = (ax + t * dx, ay + t * dy);
    ((px - qx).powi(2) + (py - qy).powi(2)).sqrt()
}

/// Anti-aliased line `thickness` pixels wide with round caps.
/// Pixels within the core of the stroke get the exact color; the rim is blended.
pub fn draw_line_aa(fb: &mut FrameBuffer, from: Point, to: Point, thickness: i32, color: u32) {
    let half = thickness.max(1) as f32 / 2.0;
    let pad = half.ceil() as i32 + 1;
    let (x0, x1) = (from.x.min(to.x).saturating_sub(pad), from.x.max(to.x).saturating_add(pad));
    let (y0, y1) = (from.y.min(to.y).saturating_sub(pad), from.y.max(to.y).saturating_add(pad));
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(fb.width as i32 - 1);
    let y1 = y1.min(fb.height as i32 - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = distance_to_segment(x as f32, y as f32, from, to);
            blend_pixel(fb, x, y, color, (half + 0.5 - d).clamp(0.0, 1.0));
        }
    }
}

/// Filled disc with a one-pixel anti-aliased rim.
pub fn fill_disc_aa(fb: &mut FrameBuffer, center: Point, radius: i32, color: u32) {
    if radius < 0 {
        return;
    }
    let r = radius as f32;
    let pad = radius + 1;
    let y0 = center.y.saturating_sub(pad).max(0);
    let y1 = center.y.saturating_add(pad).min(fb.height as i32 - 1);
    let x0 = center.x.saturating_sub(pad).max(0);
    let x1 = center.x.saturating_add(pad).min(fb.width as i32 - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = (x - center.x) as f32;
            let dy = (y - center.y) as f32;
            let d = (dx * dx + dy * dy).sqrt();
            blend_pixel(fb, x, y, color, (r + 0.5 - d).clamp(0.0, 1.0));
        }
    }
}

/// Solid rectangle covering (x,y) through (x+w, y+h) inclusive.
pub fn fill_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32) {
    for yy in y.max(0)..=(y + h).min(fb.height as i32 - 1) {
        for xx in x.max(0)..=(x + w).min(fb.width as i32 - 1) {
            put_pixel(fb, xx, yy, color);
        }
    }
}

/// Rectangle outline `thickness` pixels wide, drawn inwards from the edge.
pub fn stroke_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, thickness: i32, color: u32) {
    for t in 0..thickness.max(1) {
        draw_line(fb, x + t, y + t, x + w - t, y + t, color);
        draw_line(fb, x + t, y + h - t, x + w - t, y + h - t, color);
        draw_line(fb, x + t, y + t, x + t, y + h - t, color);
        draw_line(fb, x + w - t, y + t, x + w - t, y + h - t, color);
    }
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0, x1, y1) = (x0, y0, x1, y1);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Fingertip marker: a filled dot with a thin dark ring.
pub fn draw_marker(fb: &mut FrameBuffer, at: Point, radius: i32, color: u32) {
    fill_disc_aa(fb, at, radius + 1, 0x00_00_00_00);
    fill_disc_aa(fb, at, radius, color);
}

/* ---------- 5x7 bitmap font ---------- */

/// Return a 5x7 glyph bitmap. Lowercase letters render as uppercase.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        // Punctuation
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '_' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b11111),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '?' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100),
        '\'' => g!(0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000),

        _ => None,
    }
}

/// Draw one glyph row-bit as a `scale`x`scale` block.
fn draw_cell(fb: &mut FrameBuffer, x: i32, y: i32, scale: i32, color: u32) {
    for dy in 0..scale {
        for dx in 0..scale {
            put_pixel(fb, x + dx, y + dy, color);
        }
    }
}

/// Draw a single 5x7 character at (x,y), with a 1-cell black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, scale: i32, color: u32, shadow: bool) {
    let Some(rows) = glyph5x7(ch) else { return };
    let with_shadow = [(1, 0x00000000), (0, color)];
    let passes: &[(i32, u32)] = if shadow { &with_shadow } else { &with_shadow[1..] };
    for &(offset, c) in passes {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    let px = x + (rx + offset) * scale;
                    let py = y + (ry as i32 + offset) * scale;
                    draw_cell(fb, px, py, scale, c);
                }
            }
        }
    }
}

/// Pixel width of `text` at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    text.chars().count() as i32 * 6 * scale
}

/// Draw a text string using 5x7 glyphs; each glyph advances 6 cells.
pub fn draw_text_5x7(fb: &mut FrameBuffer, x: i32, y: i32, text: &str, scale: i32, color: u32) {
    draw_text_impl(fb, x, y, text, scale, color, true);
}

/// Same as [`draw_text_5x7`] without the drop shadow (for text on flat fills).
pub fn draw_text_plain(fb: &mut FrameBuffer, x: i32, y: i32, text: &str, scale: i32, color: u32) {
    draw_text_impl(fb, x, y, text, scale, color, false);
}

fn draw_text_impl(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, scale: i32, color: u32, shadow: bool) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, scale, color, shadow);
        x += 6 * scale; // 5 cells glyph width + 1 cell spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: u32 = 0x00FF_FFFF;
    const RED: u32 = 0x00FF_0000;

    #[test]
    fn line_core_gets_exact_color() {
        let mut fb = FrameBuffer::filled(64, 64, WHITE);
        draw_line_aa(&mut fb, Point::new(10, 20), Point::new(50, 20), 6, RED);
        for x in 10..=50 {
            assert_eq!(fb.get(x, 20), Some(RED));
        }
        // well away from the stroke nothing changes
        assert_eq!(fb.get(30, 30), Some(WHITE));
        assert_eq!(fb.get(5, 5), Some(WHITE));
    }

    #[test]
    fn line_rim_is_blended() {
        let mut fb = FrameBuffer::filled(64, 64, WHITE);
        draw_line_aa(&mut fb, Point::new(10, 10), Point::new(50, 50), 5, RED);
        // ~2.12px off the diagonal with half-width 2.5: partially covered
        let px = fb.get(30, 33).unwrap();
        assert_ne!(px, WHITE);
        assert_ne!(px, RED);
    }

    #[test]
    fn disc_fills_within_radius_only() {
        let mut fb = FrameBuffer::filled(100, 100, 0);
        fill_disc_aa(&mut fb, Point::new(50, 50), 10, WHITE);
        assert_eq!(fb.get(50, 50), Some(WHITE));
        assert_eq!(fb.get(59, 50), Some(WHITE));
        assert_eq!(fb.get(50, 41), Some(WHITE));
        assert_eq!(fb.get(62, 50), Some(0));
        assert_eq!(fb.get(58, 58), Some(0));
    }

    #[test]
    fn primitives_clip_at_edges() {
        let mut fb = FrameBuffer::filled(20, 20, 0);
        fill_disc_aa(&mut fb, Point::new(0, 0), 30, WHITE);
        draw_line_aa(&mut fb, Point::new(-40, 5), Point::new(60, 5), 3, RED);
        fill_rect(&mut fb, -5, -5, 100, 2, RED);
        assert_eq!(fb.pixels.len(), 400);
        assert_eq!(fb.get(19, 19), Some(WHITE));
    }

    #[test]
    fn extreme_endpoints_draw_nothing() {
        let mut fb = FrameBuffer::filled(20, 20, 0);
        draw_line_aa(&mut fb, Point::new(i32::MAX, i32::MIN), Point::new(i32::MAX, i32::MAX), 6, RED);
        fill_disc_aa(&mut fb, Point::new(i32::MIN, i32::MAX), 38, WHITE);
        assert!(fb.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn stroke_rect_leaves_interior() {
        let mut fb = FrameBuffer::filled(50, 50, 0);
        stroke_rect(&mut fb, 10, 10, 20, 10, 2, WHITE);
        assert_eq!(fb.get(10, 10), Some(WHITE));
        assert_eq!(fb.get(30, 20), Some(WHITE));
        assert_eq!(fb.get(11, 15), Some(WHITE));
        assert_eq!(fb.get(20, 15), Some(0));
    }

    #[test]
    fn text_covers_expected_width() {
        assert_eq!(text_width("Save", 2), 48);
        let mut fb = FrameBuffer::filled(60, 20, 0);
        draw_text_plain(&mut fb, 0, 0, "Hi", 1, WHITE);
        // top-left of 'H' is lit, gap column between glyphs is not
        assert_eq!(fb.get(0, 0), Some(WHITE));
        assert_eq!(fb.get(5, 0), Some(0));
        assert!(glyph5x7('q').is_some());
        assert!(glyph5x7('~').is_none());
    }
}
