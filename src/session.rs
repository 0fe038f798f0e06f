//! Per-frame orchestration: one landmark snapshot in, one canvas update out.
//!
//! Each frame the control bar gets the first look at the fingertip. A press
//! wins the frame; otherwise the posture decides between drawing, erasing and
//! idling. Everything the loop mutates (mode, pen, canvas, smoother history,
//! cooldown) lives here and is only touched from the frame loop.

use std::path::{Path, PathBuf};

use crate::canvas::{CanvasSurface, PenStyle};
use crate::config::Config;
use crate::controls::{Control, ControlBar};
use crate::draw::{draw_marker, draw_text_5x7};
use crate::error::Error;
use crate::ocr::Recognizer;
use crate::posture::{GestureLabel, LandmarkSnapshot, classify, fingertip_position, palm_center};
use crate::smoother::PositionSmoother;
use crate::types::{FrameBuffer, Point, rgb};

const NO_TEXT: &str = "(no text detected)";
const MARKER_RADIUS: i32 = 7;
const MARKER_COLOR: u32 = rgb(255, 0, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Draw,
    Erase,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Draw => "Draw",
            Mode::Erase => "Erase",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// What the last frame did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    Pressed(Control),
    Drew(Point),
    ErasedAt(Point),
    PalmErased(Point),
    Idle,
}

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub erase_radius: i32,
    pub switch_cooldown: u32,
    pub save_cooldown: u32,
    pub overlay_alpha: f32,
    pub output_dir: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            erase_radius: config.erase_radius,
            switch_cooldown: config.controls.switch_cooldown,
            save_cooldown: config.controls.save_cooldown,
            overlay_alpha: config.overlay_alpha,
            output_dir: config.output_dir.clone(),
        }
    }
}

pub struct SessionController<R> {
    canvas: CanvasSurface,
    controls: ControlBar,
    smoother: PositionSmoother,
    recognizer: R,
    settings: SessionSettings,
    mode: Mode,
    fingertip: Option<Point>,
    last_event: FrameEvent,
    ocr_text: String,
    notice: Option<String>,
    last_saved: Option<PathBuf>,
}

impl<R: Recognizer> SessionController<R> {
    /// Session for a `width`x`height` camera feed.
    pub fn new(config: &Config, width: usize, height: usize, recognizer: R) -> Self {
        let c = &config.controls;
        let pen = PenStyle { color: config.pen.color, thickness: config.pen.thickness };
        Self::from_parts(
            CanvasSurface::new(width, height, pen),
            ControlBar::layout(width as i32, c.margin, (c.button_width, c.button_height), &Control::ALL),
            PositionSmoother::new(config.smoothing_window),
            recognizer,
            SessionSettings::from(config),
        )
    }

    pub fn from_parts(
        canvas: CanvasSurface,
        controls: ControlBar,
        smoother: PositionSmoother,
        recognizer: R,
        settings: SessionSettings,
    ) -> Self {
        Self {
            canvas,
            controls,
            smoother,
            recognizer,
            settings,
            mode: Mode::Draw,
            fingertip: None,
            last_event: FrameEvent::Idle,
            ocr_text: String::new(),
            notice: None,
            last_saved: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &CanvasSurface {
        &self.canvas
    }

    #[cfg(test)]
    pub fn controls(&self) -> &ControlBar {
        &self.controls
    }

    pub fn last_event(&self) -> FrameEvent {
        self.last_event
    }

    /// Text from the last save, or the no-text placeholder. Empty before any save.
    pub fn ocr_text(&self) -> &str {
        &self.ocr_text
    }

    /// Last failure shown to the user, if any.
    #[cfg(test)]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn last_saved(&self) -> Option<&PathBuf> {
        self.last_saved.as_ref()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            log::info!("mode: {}", mode.label());
        }
        self.mode = mode;
        self.canvas.reset_continuity();
    }

    /// Keyboard clear: blank canvas, forget the recognized text.
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.ocr_text.clear();
        self.notice = None;
        log::info!("canvas cleared");
    }

    /// Advance one frame.
    pub fn step(&mut self, hand: Option<&LandmarkSnapshot>) -> Flow {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        let tip = fingertip_position(hand, w, h);
        self.fingertip = tip;

        self.controls.tick();
        if self.controls.cooldown_frames() == 0 {
            if let Some(control) = tip.and_then(|p| self.controls.hit_test(p)) {
                self.canvas.reset_continuity();
                self.last_event = FrameEvent::Pressed(control);
                return self.press(control);
            }
        }

        self.last_event = match (hand, classify(hand).1) {
            (Some(_), GestureLabel::PalmOpen) => match palm_center(hand, w, h) {
                Some(center) => {
                    self.canvas.erase_at(Some(center), self.settings.erase_radius);
                    self.canvas.reset_continuity();
                    FrameEvent::PalmErased(center)
                }
                None => self.idle(),
            },
            (Some(_), GestureLabel::Pointing) => match tip {
                Some(raw) => self.track(raw),
                None => self.idle(),
            },
            _ => self.idle(),
        };
        Flow::Continue
    }

    fn idle(&mut self) -> FrameEvent {
        self.canvas.reset_continuity();
        FrameEvent::Idle
    }

    fn track(&mut self, raw: Point) -> FrameEvent {
        let p = self.smoother.filter(raw);
        match self.mode {
            Mode::Draw => {
                self.canvas.draw_segment(self.canvas.previous_point(), Some(p));
                FrameEvent::Drew(p)
            }
            Mode::Erase => {
                self.canvas.erase_at(Some(p), self.settings.erase_radius);
                self.canvas.reset_continuity();
                FrameEvent::ErasedAt(p)
            }
        }
    }

    fn press(&mut self, control: Control) -> Flow {
        let cooldown = match control {
            Control::Exit => {
                log::info!("exit requested");
                return Flow::Exit;
            }
            Control::Draw => {
                self.set_mode(Mode::Draw);
                self.settings.switch_cooldown
            }
            Control::Erase => {
                self.set_mode(Mode::Erase);
                self.settings.switch_cooldown
            }
            Control::Black | Control::Red | Control::Green | Control::Blue => {
                if self.canvas.set_color(control.label()) {
                    log::info!("pen color: {}", self.canvas.pen().color.name());
                }
                self.settings.switch_cooldown
            }
            Control::Save => {
                self.save_and_recognize();
                self.settings.save_cooldown
            }
        };
        log::debug!("{} pressed, ignoring controls for {cooldown} frames", control.label());
        self.controls.arm_cooldown(cooldown);
        Flow::Continue
    }

    fn save_and_recognize(&mut self) {
        self.notice = None;
        let path = match self.canvas.persist(&self.settings.output_dir) {
            Ok(path) => path,
            Err(e) => {
                log::error!("{e}");
                self.notice = Some(format!("save failed: {e}"));
                return;
            }
        };
        log::info!("saved drawing to {}", path.display());
        self.last_saved = Some(path.clone());

        match self.recognize_file(&path) {
            Ok(text) if text.is_empty() => {
                log::warn!("no text recognized in {}", path.display());
                self.ocr_text = NO_TEXT.into();
            }
            Ok(text) => {
                log::info!("recognized: {text}");
                self.ocr_text = text;
            }
            Err(e) => {
                log::error!("{e}");
                self.notice = Some(format!("recognition failed: {e}"));
            }
        }
    }

    /// Recognize what was written to disk rather than the live buffer.
    fn recognize_file(&mut self, path: &Path) -> Result<String, Error> {
        let image = image::open(path)
            .map_err(|e| Error::Persist { path: path.to_path_buf(), reason: format!("reload: {e}") })?
            .to_rgb8();
        self.recognizer.recognize(&image)
    }

    /// Display frame: buttons and fingertip marker on the camera image, the
    /// canvas blended over it, then the status text.
    pub fn compose(&mut self, mut frame: FrameBuffer) -> Result<FrameBuffer, Error> {
        self.controls.render_state(self.mode.label());
        self.controls.render(&mut frame);
        if let Some(tip) = self.fingertip {
            draw_marker(&mut frame, tip, MARKER_RADIUS, MARKER_COLOR);
        }

        let mut out = self.canvas.overlay(&frame, self.settings.overlay_alpha)?;

        let status = format!(
            "Mode: {} | Tip: index finger to draw, open palm to erase",
            self.mode.label().to_ascii_uppercase()
        );
        let bottom = out.height as i32 - 18;
        draw_text_5x7(&mut out, 12, bottom, &status, 1, rgb(255, 255, 255));

        let mut y = self.controls.buttons().iter().map(|b| b.rect.y + b.rect.h).max().unwrap_or(0) + 12;
        if !self.ocr_text.is_empty() {
            draw_text_5x7(&mut out, 12, y, &format!("OCR: {}", self.ocr_text), 2, rgb(255, 255, 0));
            y += 20;
        }
        if let Some(notice) = &self.notice {
            draw_text_5x7(&mut out, 12, y, notice, 2, rgb(255, 120, 0));
        }
        Ok(out)
    }
}
