//! Result artifact storage
//!
//! Each successfully crawled URL produces one JSON file inside the crawled
//! directory. The file name comes from a caller-supplied naming function.

use crate::state::Payload;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Derives an artifact file name from a URL
pub type NameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Extension appended by [`default_name_fn`]
pub const ARTIFACT_EXTENSION: &str = "json";

/// Names an artifact after the last path segment of the URL
///
/// `https://example.com/items/42` becomes `42.json`. Trailing slashes are
/// ignored, and a URL without any segment falls back to `index.json`.
pub fn default_name_fn(url: &str) -> String {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && !s.ends_with(':'))
        .unwrap_or("index");
    format!("{}.{}", segment, ARTIFACT_EXTENSION)
}

/// Writes crawl artifacts to a directory
pub struct ResultStore {
    dir: PathBuf,
    name_fn: NameFn,
}

impl ResultStore {
    /// Opens the store, creating the directory if needed
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory receiving the artifacts
    /// * `name_fn` - Maps a URL to its artifact file name
    pub fn new(dir: &Path, name_fn: NameFn) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            name_fn,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the artifact for `url` is written to
    pub fn artifact_path(&self, url: &str) -> PathBuf {
        self.dir.join((self.name_fn)(url))
    }

    /// Serializes the payload to the URL's artifact file
    ///
    /// An existing artifact is overwritten. The write is not atomic: a crash
    /// mid-write leaves a partial file that the next successful fetch of the
    /// same URL replaces.
    pub fn write(&self, url: &str, payload: &Payload) -> Result<PathBuf, crate::CrawlError> {
        let path = self.artifact_path(url);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, payload)?;
        writer.flush()?;
        Ok(path)
    }

    /// Counts the artifacts currently in the directory
    pub fn count(&self) -> std::io::Result<usize> {
        let mut count = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            if entry?.file_type()?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }
}
