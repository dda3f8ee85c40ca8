#![forbid(unsafe_code)]

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("repository error: {0}")]
    Repository(#[source] BoxError),

    #[error("classifier error: {0}")]
    Classifier(#[source] BoxError),
}

impl Error {
    pub fn repository(err: impl Into<BoxError>) -> Self {
        Self::Repository(err.into())
    }

    pub fn classifier(err: impl Into<BoxError>) -> Self {
        Self::Classifier(err.into())
    }
}
