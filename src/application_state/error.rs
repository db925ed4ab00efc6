//! Errors raised while loading an image into the store.

use thiserror::Error;

use crate::image_pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[cfg(target_family = "wasm")]
    #[error("could not fetch example '{name}': {source}")]
    Fetch {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("no example images are bundled")]
    NoExamples,
}
