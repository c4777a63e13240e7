use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::scene::SceneId;

/// Misuse of the scene registry. The registry is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene {0} is already registered")]
    DuplicateId(SceneId),
    #[error("scene {0} is not registered")]
    NotRegistered(SceneId),
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("window error: {0}")]
    Window(String),
    #[error("display has not been prepared")]
    NotPrepared,
    #[error("display has been cleaned up")]
    Closed,
}

/// Failure to load a texture, font or audio clip.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid texture data: {0}")]
    TextureData(String),
    #[error("failed to parse font: {0}")]
    Font(String),
    #[error("audio error: {0}")]
    Audio(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error("engine is already running")]
    AlreadyRunning,
    #[error("engine has been stopped and cannot be restarted")]
    ShutDown,
    #[error("failed to spawn update thread: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("a logger is already installed: {0}")]
    Install(#[from] log::SetLoggerError),
}
