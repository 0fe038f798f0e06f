// Crate error type. Every variant states *where* things went wrong.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed
    #[error("Hand detector error: {0}")]
    Detector(String), // The landmark source produced something unusable
    #[error("Could not save drawing to {}: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },
    #[error("Recognition error: {0}")]
    Recognize(String),
    #[error("Config error: {0}")]
    Config(String),
}
