//! On-screen control bar: hover the fingertip over a button to press it.
//!
//! Hover is continuous, so a press would repeat every frame. The bar carries a
//! frame countdown; while it is positive the session skips hit-testing.

use crate::draw::{draw_text_plain, fill_rect, stroke_rect, text_width};
use crate::types::{FrameBuffer, Point, rgb};

const ACTIVE_FILL: u32 = rgb(0, 200, 0);
const BORDER: u32 = rgb(30, 30, 30);
const LABEL_SCALE: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Draw,
    Erase,
    Save,
    Black,
    Red,
    Green,
    Blue,
    Exit,
}

impl Control {
    /// Every control in bar order.
    pub const ALL: [Control; 8] = [
        Control::Draw,
        Control::Erase,
        Control::Save,
        Control::Black,
        Control::Red,
        Control::Green,
        Control::Blue,
        Control::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::Draw => "Draw",
            Control::Erase => "Erase",
            Control::Save => "Save",
            Control::Black => "Black",
            Control::Red => "Red",
            Control::Green => "Green",
            Control::Blue => "Blue",
            Control::Exit => "Exit",
        }
    }

    fn base_color(self) -> u32 {
        match self {
            Control::Black => rgb(0, 0, 0),
            Control::Red => rgb(255, 0, 0),
            Control::Green => rgb(0, 255, 0),
            Control::Blue => rgb(0, 0, 255),
            Control::Exit => rgb(180, 180, 180),
            Control::Draw | Control::Erase | Control::Save => rgb(220, 220, 220),
        }
    }
}

/// Axis-aligned rectangle; both edges count as inside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn contains(&self, p: Point) -> bool {
        self.x <= p.x && p.x <= self.x + self.w && self.y <= p.y && p.y <= self.y + self.h
    }
}

#[derive(Clone, Debug)]
pub struct Button {
    pub control: Control,
    pub rect: Rect,
    pub base_color: u32,
    pub active: bool,
}

impl Button {
    pub fn label(&self) -> &'static str {
        self.control.label()
    }

    fn render(&self, fb: &mut FrameBuffer) {
        let Rect { x, y, w, h } = self.rect;
        fill_rect(fb, x, y, w, h, if self.active { ACTIVE_FILL } else { self.base_color });
        stroke_rect(fb, x, y, w, h, 2, BORDER);
        let text = if self.base_color == rgb(0, 0, 0) { rgb(255, 255, 255) } else { rgb(0, 0, 0) };
        let tx = x + (w - text_width(self.label(), LABEL_SCALE)) / 2;
        let ty = y + (h - 7 * LABEL_SCALE) / 2;
        draw_text_plain(fb, tx, ty, self.label(), LABEL_SCALE, text);
    }
}

pub struct ControlBar {
    buttons: Vec<Button>,
    cooldown_frames: u32,
}

impl ControlBar {
    /// Place buttons left to right from (margin, margin), starting a new row
    /// whenever the next one would cross `frame_width - margin`.
    pub fn layout(frame_width: i32, margin: i32, size: (i32, i32), controls: &[Control]) -> Self {
        let (bw, bh) = size;
        let (mut x, mut y) = (margin, margin);
        let mut buttons = Vec::with_capacity(controls.len());
        for &control in controls {
            if x > margin && x + bw + margin > frame_width {
                x = margin;
                y += bh + margin;
            }
            buttons.push(Button {
                control,
                rect: Rect { x, y, w: bw, h: bh },
                base_color: control.base_color(),
                active: false,
            });
            x += bw + margin;
        }
        Self { buttons, cooldown_frames: 0 }
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// First button in layout order under `p`.
    pub fn hit_test(&self, p: Point) -> Option<Control> {
        self.buttons.iter().find(|b| b.rect.contains(p)).map(|b| b.control)
    }

    /// Highlight the button whose label matches, ignoring case; display only.
    pub fn render_state(&mut self, active_label: &str) {
        for b in &mut self.buttons {
            b.active = b.label().eq_ignore_ascii_case(active_label);
        }
    }

    pub fn render(&self, fb: &mut FrameBuffer) {
        for b in &self.buttons {
            b.render(fb);
        }
    }

    pub fn cooldown_frames(&self) -> u32 {
        self.cooldown_frames
    }

    pub fn arm_cooldown(&mut self, frames: u32) {
        self.cooldown_frames = frames;
    }

    /// One frame has passed.
    pub fn tick(&mut self) {
        self.cooldown_frames = self.cooldown_frames.saturating_sub(1);
    }
}
