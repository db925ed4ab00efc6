//! # Example Catalog
//!
//! The bundled example images, cycled in order. Bytes are kept in an LRU cache once
//! fetched so revisiting an example never hits the disk or the network again.

use std::num::NonZeroUsize;

use lru::LruCache;

use super::error::LoadError;

/// Example images shipped under `assets/examples/`.
pub const EXAMPLE_NAMES: [&str; 4] = ["heart.png", "mushroom.png", "smiley.png", "potion.png"];

/// Path of the examples directory, relative to the working directory or the page origin.
pub const EXAMPLES_DIR: &str = "assets/examples";

const EXAMPLE_CACHE_CAPACITY: usize = 8;

/// A request for one example image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleRequest {
    pub index: usize,
    pub name: String,
}

pub struct ExampleCatalog {
    names: Vec<String>,
    cache: LruCache<usize, Vec<u8>>,
}

impl Default for ExampleCatalog {
    fn default() -> Self {
        Self::new(EXAMPLE_NAMES.iter().map(|name| name.to_string()).collect())
    }
}

impl ExampleCatalog {
    pub fn new(names: Vec<String>) -> Self {
        let capacity = NonZeroUsize::new(EXAMPLE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            names,
            cache: LruCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The example after `current`, wrapping around. `None` starts from the first one.
    pub fn request_after(&self, current: Option<usize>) -> Result<ExampleRequest, LoadError> {
        if self.names.is_empty() {
            return Err(LoadError::NoExamples);
        }

        let index = current.map_or(0, |current| (current + 1) % self.names.len());
        Ok(ExampleRequest {
            index,
            name: self.names[index].clone(),
        })
    }

    /// Cached bytes for an example, refreshing its position in the cache.
    pub fn cached(&mut self, index: usize) -> Option<&[u8]> {
        self.cache.get(&index).map(Vec::as_slice)
    }

    pub fn remember(&mut self, index: usize, bytes: Vec<u8>) {
        self.cache.put(index, bytes);
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        /// Fetches an example relative to the page origin.
        pub async fn fetch_example(request: &ExampleRequest) -> Result<Vec<u8>, LoadError> {
            let origin = web_sys::window()
                .and_then(|window| window.location().origin().ok())
                .unwrap_or_default();
            let url = format!("{}/{}/{}", origin, EXAMPLES_DIR, request.name);

            let fetch_error = |source| LoadError::Fetch {
                name: request.name.clone(),
                source,
            };
            let response = reqwest::get(&url)
                .await
                .and_then(|response| response.error_for_status())
                .map_err(fetch_error)?;
            let bytes = response.bytes().await.map_err(fetch_error)?;

            log::info!("Fetched example '{}' ({} bytes)", request.name, bytes.len());
            Ok(bytes.to_vec())
        }
    } else {
        /// Reads an example from the examples directory.
        pub fn fetch_example(request: &ExampleRequest) -> Result<Vec<u8>, LoadError> {
            let path = std::path::Path::new(EXAMPLES_DIR).join(&request.name);
            let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;

            log::info!("Read example '{}' ({} bytes)", request.name, bytes.len());
            Ok(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ExampleCatalog {
        ExampleCatalog::new(vec!["a.png".into(), "b.png".into(), "c.png".into()])
    }

    #[test]
    fn requests_cycle_round_robin() {
        let catalog = catalog();
        let first = catalog.request_after(None).unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.name, "a.png");

        assert_eq!(catalog.request_after(Some(1)).unwrap().index, 2);
        assert_eq!(catalog.request_after(Some(2)).unwrap().index, 0);
    }

    #[test]
    fn empty_catalog_has_nothing_to_offer() {
        let catalog = ExampleCatalog::new(Vec::new());
        assert!(matches!(catalog.request_after(None), Err(LoadError::NoExamples)));
    }

    #[test]
    fn cache_returns_remembered_bytes() {
        let mut catalog = catalog();
        assert!(catalog.cached(1).is_none());

        catalog.remember(1, vec![1, 2, 3]);
        assert_eq!(catalog.cached(1), Some(&[1u8, 2, 3][..]));
    }

    #[cfg(not(target_family = "wasm"))]
    #[test]
    fn missing_example_file_is_an_io_error() {
        let request = ExampleRequest {
            index: 0,
            name: "does-not-exist.png".into(),
        };
        assert!(matches!(fetch_example(&request), Err(LoadError::Io { .. })));
    }
}
