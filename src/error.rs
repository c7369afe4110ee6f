//! Error types for shapegen

use thiserror::Error;

use crate::model::Diagnostics;

/// Result type for shapegen operations
pub type Result<T> = std::result::Result<T, ShapegenError>;

/// Errors outside the per-type model errors
#[derive(Error, Debug)]
pub enum ShapegenError {
    #[error("Invalid descriptor: {}", .0.join("; "))]
    InvalidDescriptor(Vec<String>),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("No descriptors found under {0}")]
    NoDescriptors(String),

    #[error("Model has errors:\n{0}")]
    Model(Diagnostics),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
