// Air canvas: draw in front of the webcam with your index finger.
// • Index up, middle down: draw (or erase, in Erase mode) at the fingertip.
// • Open palm: erase under the palm.
// • Hover the fingertip over a button to switch mode/color, save + recognize, or exit.
// • C clears the canvas. ESC quits.
//
// Without a landmark stream the mouse stands in for the hand:
// hold LMB to point, RMB for an open palm.

mod camera;
mod canvas;
mod config;
mod controls;
mod detector;
mod draw;
mod error;
mod ocr;
mod posture;
mod session;
mod smoother;
mod types;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;

use camera::CameraCapture;
use config::Config;
use detector::{HandDetector, LandmarkStream, PointerHand};
use draw::{Drawer, draw_text_5x7, text_width};
use ocr::TesseractCli;
use session::{Flow, FrameEvent, SessionController};

#[derive(Parser, Debug)]
#[command(version, about = "Draw on a virtual canvas with hand gestures")]
struct Args {
    /// TOML config file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera index (overrides the config file).
    #[arg(long)]
    camera: Option<u32>,

    /// Newline-delimited JSON landmark stream (file or FIFO) from an external hand tracker.
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// Where saved drawings go (overrides the config file).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print the available cameras and exit.
    #[arg(long)]
    list_cameras: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    let args = Args::parse();

    if args.list_cameras {
        for (index, name) in camera::list_cameras()? {
            println!("{index:<5} | {name}");
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::parse("")?,
    };
    if let Some(index) = args.camera {
        config.camera.index = index;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    log::info!("saving drawings under {}", config.output_dir.display());

    /* --- Camera + window setup ---
       The first frame fixes the canvas size; no frame at all is fatal. */
    let mut cam = CameraCapture::new(&config.camera)?;
    let first = cam.next_frame().context("could not read from the camera")?;
    let (w, h) = (first.width, first.height);
    let (cw, ch) = cam.resolution();
    if (cw as usize, ch as usize) != (w, h) {
        log::warn!("camera reports {cw}x{ch} but delivers {w}x{h}");
    }
    let mut drawer = Drawer::new(&window_title("Draw"), w, h)?;
    log::info!("window open at {w}x{h}");

    /* --- Hand source --- */
    let mut pointer_hand = PointerHand::default();
    let mut stream = match &args.landmarks {
        Some(path) => {
            log::info!("reading hand landmarks from {}", path.display());
            Some(LandmarkStream::open(path)?)
        }
        None => {
            log::info!("no landmark stream; the mouse drives the hand (LMB point, RMB palm)");
            None
        }
    };

    let recognizer = TesseractCli::new(config.ocr.clone());
    let mut session = SessionController::new(&config, w, h, recognizer);

    /* --- FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    let mut pending = Some(first);
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        // 1) One camera frame per iteration.
        let live = match pending.take() {
            Some(frame) => frame,
            None => cam.next_frame()?,
        };

        // 2) Keyboard, outside the gesture path.
        if drawer.c_pressed_once() {
            session.clear();
        }

        // 3) Detect and advance the session.
        pointer_hand.update(drawer.pointer());
        let detector: &mut dyn HandDetector = match stream.as_mut() {
            Some(s) => s,
            None => &mut pointer_hand,
        };
        let hand = detector.detect(&live)?;
        if session.step(hand.as_ref()) == Flow::Exit {
            break;
        }
        if let FrameEvent::Pressed(_) = session.last_event() {
            drawer.set_title(&window_title(session.mode().label()));
        }

        // 4) Compose and present.
        let mut out = session.compose(live)?;
        let fx = w as i32 - text_width(&hud_fps_text, 1) - 8;
        draw_text_5x7(&mut out, fx, h as i32 - 18, &hud_fps_text, 1, 0x00_FF_FF_FF);
        drawer.present(&out)?;

        // 5) FPS counter, once per second.
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            log::debug!("FPS: {fps:.1}");
            hud_fps_text = format!("FPS: {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    if let Some(path) = session.last_saved() {
        log::info!("last drawing: {} ({})", path.display(), session.ocr_text());
    }
    Ok(())
}

fn window_title(mode: &str) -> String {
    format!("Air Canvas - {mode} - Draw / Erase / Save + OCR")
}
