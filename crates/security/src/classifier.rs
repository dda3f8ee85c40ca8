#![forbid(unsafe_code)]

use crate::error::Error;
use parking_lot::Mutex;
use std::{collections::VecDeque, fmt, sync::Arc};

/// Encoded camera frame. The service never looks inside; only the
/// classifier does.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub trait ImageClassifier: Send + Sync {
    /// Whether `image` shows a cat with at least `confidence_threshold`
    /// percent confidence.
    fn image_contains_cat(&self, image: &Image, confidence_threshold: f32) -> Result<bool, Error>;
}

/// Classifier that replays queued answers in order and reports no cat once
/// the queue runs dry. Clones share the queue, so a caller can keep a handle
/// to feed answers after handing one to the service.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClassifier {
    answers: Arc<Mutex<VecDeque<bool>>>,
}

impl ScriptedClassifier {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into_iter().collect())),
        }
    }

    pub fn push(&self, contains_cat: bool) {
        self.answers.lock().push_back(contains_cat);
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().len()
    }
}

impl ImageClassifier for ScriptedClassifier {
    fn image_contains_cat(&self, _image: &Image, _confidence_threshold: f32) -> Result<bool, Error> {
        Ok(self.answers.lock().pop_front().unwrap_or(false))
    }
}
