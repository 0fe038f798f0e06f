use std::{fs, path::Path, path::PathBuf};

use serde::Deserialize;

use crate::canvas::{DEFAULT_OVERLAY_ALPHA, PenColor, PenStyle};
use crate::error::Error;
use crate::smoother::DEFAULT_WINDOW;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub pen: PenConfig,
    /// Radius of the disc cleared by the eraser (finger and palm).
    pub erase_radius: i32,
    /// Number of fingertip samples averaged while drawing.
    pub smoothing_window: usize,
    /// Opacity of the canvas blended over the live frame.
    pub overlay_alpha: f32,
    pub controls: ControlsConfig,
    pub output_dir: PathBuf,
    pub ocr: OcrConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            pen: PenConfig::default(),
            erase_radius: 38,
            smoothing_window: DEFAULT_WINDOW,
            overlay_alpha: DEFAULT_OVERLAY_ALPHA,
            controls: ControlsConfig::default(),
            output_dir: PathBuf::from("output/saved_drawings"),
            ocr: OcrConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    /// Flip frames horizontally (selfie view).
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { index: 0, width: 640, height: 480, mirror: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PenConfig {
    pub color: PenColor,
    pub thickness: i32,
}

impl Default for PenConfig {
    fn default() -> Self {
        let pen = PenStyle::default();
        Self { color: pen.color, thickness: pen.thickness }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub margin: i32,
    pub button_width: i32,
    pub button_height: i32,
    /// Frames to ignore the bar after a mode or color switch.
    pub switch_cooldown: u32,
    /// Frames to ignore the bar after save + recognize.
    pub save_cooldown: u32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            margin: 10,
            button_width: 120,
            button_height: 40,
            switch_cooldown: 12,
            save_cooldown: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable; `TESSERACT_CMD` wins when set.
    pub command: String,
    pub page_segmentation: u8,
    pub engine_mode: u8,
    pub whitelist: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".into(),
            page_segmentation: 6,
            engine_mode: 3,
            whitelist: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz".into(),
        }
    }
}

impl Config {
    pub fn load<A: AsRef<Path>>(path: A) -> Result<Self, Error> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Error> {
        let mut config: Self =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        if let Ok(cmd) = std::env::var("TESSERACT_CMD") {
            if !cmd.is_empty() {
                config.ocr.command = cmd;
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let fail = |msg: String| Err(Error::Config(msg));
        if self.smoothing_window == 0 {
            return fail("`smoothing_window` must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.overlay_alpha) {
            return fail(format!("`overlay_alpha` must be within 0..=1 (got {})", self.overlay_alpha));
        }
        if self.pen.thickness <= 0 || self.erase_radius <= 0 {
            return fail("pen thickness and erase radius must be positive".into());
        }
        let c = &self.controls;
        if c.button_width <= 0 || c.button_height <= 0 || c.margin < 0 {
            return fail("button size must be positive and margin non-negative".into());
        }
        if c.switch_cooldown == 0 || c.save_cooldown == 0 {
            return fail("control cooldowns must be at least one frame".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.erase_radius, 38);
        assert_eq!(config.smoothing_window, 5);
        assert_eq!(config.controls.switch_cooldown, 12);
        assert_eq!(config.controls.save_cooldown, 15);
        assert_eq!(config.pen.color, PenColor::Blue);
        assert_eq!(config.camera.width, 640);
        assert!(config.camera.mirror);
    }

    #[test]
    fn defaults_follow_drawing_constants() {
        let config = Config::default();
        let pen = PenStyle::default();
        assert_eq!(config.pen.color, pen.color);
        assert_eq!(config.pen.thickness, pen.thickness);
        assert_eq!(config.smoothing_window, DEFAULT_WINDOW);
        assert_eq!(config.overlay_alpha, DEFAULT_OVERLAY_ALPHA);
    }

    #[test]
    fn parses_example_config() {
        let config = Config::load("config.example.toml").unwrap();
        assert_eq!(config.ocr.page_segmentation, 6);
        assert_eq!(config.controls.button_width, 120);
    }

    #[test]
    fn parses_partial_tables() {
        let config = Config::parse(
            r#"
            erase_radius = 20
            output_dir = "/tmp/drawings"

            [pen]
            color = "red"

            [controls]
            save_cooldown = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.erase_radius, 20);
        assert_eq!(config.pen.color, PenColor::Red);
        assert_eq!(config.pen.thickness, 6);
        assert_eq!(config.controls.save_cooldown, 30);
        assert_eq!(config.controls.switch_cooldown, 12);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/drawings"));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Config::parse("smoothing_window = 0").is_err());
        assert!(Config::parse("overlay_alpha = 1.5").is_err());
        assert!(Config::parse("[pen]\nthickness = 0").is_err());
        assert!(Config::parse("[controls]\nswitch_cooldown = 0").is_err());
        assert!(Config::parse("[pen]\ncolor = \"magenta\"").is_err());
    }
}
