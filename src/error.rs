// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 统一错误类型 (Error types)

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode or encode image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid label at {path}:{line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("label file '{label}' not found for image '{image}'")]
    MissingLabel { image: PathBuf, label: PathBuf },

    #[error("invalid config '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("training step `{step}` could not be started: {source}")]
    TrainerSpawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error("training step `{step}` exited with {status}")]
    TrainerFailed { step: String, status: String },

    #[error("invalid font file '{path}'")]
    Font { path: PathBuf },

    #[error("inference error: {0}")]
    Inference(String),

    #[error(transparent)]
    Ort(#[from] ort::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}
