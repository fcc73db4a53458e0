//! Error type for resource loading and encoding

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("malformed mesh: {0}")]
    MalformedMesh(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
