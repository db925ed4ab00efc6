//! # Image Store
//!
//! Holds the image currently on screen. It changes through [`ImageStore::load_from_file`],
//! [`ImageStore::load_next_example`] and [`ImageStore::clear`]. Web builds fetch examples
//! asynchronously and finish with [`ImageStore::load_example`] once the bytes arrive.
//! A failed load leaves the previous image in place.
//!
//! Every successful change bumps a revision counter. The engine rebuilds its scene
//! whenever the revision it last saw differs from the store's.

use crate::image_pipeline::{loader, process, PipelineError, PixelBuffer, ProcessOptions};

use super::{
    error::LoadError,
    examples::{ExampleCatalog, ExampleRequest},
};

/// Longest file name shown in the caption, ellipsis included.
pub const CAPTION_NAME_LIMIT: usize = 33;

/// A named blob of encoded image bytes.
#[derive(Clone, Debug)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, naming it after the last path component.
    pub fn read(path: &std::path::Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, bytes))
    }
}

/// The image on screen, decoded and processed.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    pub name: String,
    pub mime_type: &'static str,
    pub byte_len: usize,
    pub source: PixelBuffer,
    pub processed: PixelBuffer,
    /// Catalog index when the image is a bundled example
    pub example_index: Option<usize>,
}

impl LoadedImage {
    fn decode(
        file: &ImageFile,
        options: &ProcessOptions,
        example_index: Option<usize>,
    ) -> Result<Self, PipelineError> {
        let source = loader::decode(&file.bytes)?;
        let processed = process(&source, options)?;

        Ok(Self {
            name: file.name.clone(),
            mime_type: loader::sniff_mime_type(&file.bytes),
            byte_len: file.bytes.len(),
            source,
            processed,
            example_index,
        })
    }

    /// Short description: truncated name, MIME type and size in kB.
    pub fn caption(&self) -> String {
        format!(
            "{} - {} {}kb",
            truncate_name(&self.name, CAPTION_NAME_LIMIT),
            self.mime_type,
            (self.byte_len as f64 / 1000.0).round()
        )
    }
}

/// Shortens `name` to at most `limit` characters, ending in `...` when cut.
pub fn truncate_name(name: &str, limit: usize) -> String {
    if name.chars().count() <= limit {
        return name.to_string();
    }

    let kept: String = name.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub struct ImageStore {
    options: ProcessOptions,
    examples: ExampleCatalog,
    current: Option<LoadedImage>,
    revision: u64,
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new(ProcessOptions::default(), ExampleCatalog::default())
    }
}

impl ImageStore {
    pub fn new(options: ProcessOptions, examples: ExampleCatalog) -> Self {
        Self {
            options,
            examples,
            current: None,
            revision: 0,
        }
    }

    /// The image on screen, if any.
    pub fn current(&self) -> Option<&LoadedImage> {
        self.current.as_ref()
    }

    /// Bumped on every change to the current image, including clears.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Window caption for the current image.
    pub fn caption(&self) -> Option<String> {
        self.current.as_ref().map(LoadedImage::caption)
    }

    /// Loads a user-provided file. `None` clears the store.
    pub fn load_from_file(&mut self, file: Option<ImageFile>) -> Result<(), LoadError> {
        let Some(file) = file else {
            self.clear();
            return Ok(());
        };

        let image = LoadedImage::decode(&file, &self.options, None)?;
        self.replace(Some(image));
        Ok(())
    }

    /// The example that follows the one on screen, or the first example otherwise.
    pub fn next_example(&self) -> Result<ExampleRequest, LoadError> {
        let current = self.current.as_ref().and_then(|image| image.example_index);
        self.examples.request_after(current)
    }

    /// Cached bytes for a requested example.
    pub fn cached_example(&mut self, request: &ExampleRequest) -> Option<Vec<u8>> {
        self.examples.cached(request.index).map(<[u8]>::to_vec)
    }

    /// Caches freshly fetched example bytes and shows them.
    pub fn load_example(&mut self, request: &ExampleRequest, bytes: Vec<u8>) -> Result<(), LoadError> {
        let file = ImageFile::new(request.name.clone(), bytes);
        let image = LoadedImage::decode(&file, &self.options, Some(request.index))?;

        self.examples.remember(request.index, file.bytes);
        self.replace(Some(image));
        Ok(())
    }

    /// Advances to the next example, serving bytes from the cache when possible and from
    /// `fetch` otherwise.
    pub fn load_next_example<F>(&mut self, fetch: F) -> Result<(), LoadError>
    where
        F: FnOnce(&ExampleRequest) -> Result<Vec<u8>, LoadError>,
    {
        let request = self.next_example()?;
        let bytes = match self.cached_example(&request) {
            Some(bytes) => bytes,
            None => fetch(&request)?,
        };
        self.load_example(&request, bytes)
    }

    /// Removes the current image. A no-op on an empty store.
    pub fn clear(&mut self) {
        if self.current.is_some() {
            self.replace(None);
        }
    }

    fn replace(&mut self, image: Option<LoadedImage>) {
        match &image {
            Some(image) => log::info!(
                "Loaded '{}': {}x{} source, {} opaque pixels after processing",
                image.name,
                image.source.width(),
                image.source.height(),
                image.processed.opaque_count()
            ),
            None => log::info!("Cleared image"),
        }

        self.current = image;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::{cell::Cell, io::Cursor};

    fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn store() -> ImageStore {
        ImageStore::new(
            ProcessOptions::default(),
            ExampleCatalog::new(vec!["one.png".into(), "two.png".into()]),
        )
    }

    #[test]
    fn loading_a_file_bumps_revision() {
        let mut store = store();
        store
            .load_from_file(Some(ImageFile::new("red.png", png_bytes(32, 32, [255, 0, 0, 255]))))
            .unwrap();

        let image = store.current().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.processed.width(), 16);
        assert_eq!(image.example_index, None);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn failed_load_keeps_previous_image() {
        let mut store = store();
        store
            .load_from_file(Some(ImageFile::new("ok.png", png_bytes(4, 4, [0, 0, 255, 255]))))
            .unwrap();

        let result = store.load_from_file(Some(ImageFile::new("bad.png", b"not an image".to_vec())));
        assert!(matches!(result, Err(LoadError::Pipeline(PipelineError::Decode(_)))));
        assert_eq!(store.current().unwrap().name, "ok.png");
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn none_and_clear_empty_the_store() {
        let mut store = store();
        store
            .load_from_file(Some(ImageFile::new("ok.png", png_bytes(4, 4, [0, 0, 255, 255]))))
            .unwrap();

        store.load_from_file(None).unwrap();
        assert!(store.current().is_none());
        assert_eq!(store.revision(), 2);

        store.clear();
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn examples_cycle_and_come_from_cache_on_revisit() {
        let mut store = store();
        let fetches = Cell::new(0);
        let fetch = |_: &ExampleRequest| {
            fetches.set(fetches.get() + 1);
            Ok(png_bytes(8, 8, [0, 255, 0, 255]))
        };

        store.load_next_example(fetch).unwrap();
        assert_eq!(store.current().unwrap().example_index, Some(0));
        store.load_next_example(fetch).unwrap();
        assert_eq!(store.current().unwrap().example_index, Some(1));
        store.load_next_example(fetch).unwrap();
        assert_eq!(store.current().unwrap().example_index, Some(0));

        assert_eq!(fetches.get(), 2);
        assert_eq!(store.current().unwrap().name, "one.png");
    }

    #[test]
    fn fetch_failure_keeps_state() {
        let mut store = store();
        let result = store.load_next_example(|_| Err(LoadError::NoExamples));
        assert!(result.is_err());
        assert!(store.current().is_none());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn caption_truncates_long_names() {
        assert_eq!(truncate_name("short.png", 33), "short.png");

        let long = "a".repeat(40);
        let truncated = truncate_name(&long, 33);
        assert_eq!(truncated.chars().count(), 33);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn caption_lists_type_and_size() {
        let mut store = store();
        store
            .load_from_file(Some(ImageFile::new("dot.png", png_bytes(1, 1, [9, 9, 9, 255]))))
            .unwrap();

        let caption = store.caption().unwrap();
        assert!(caption.starts_with("dot.png - image/png "));
        assert!(caption.ends_with("kb"));
    }
}
