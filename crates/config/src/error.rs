#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to extract config: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),
}
