use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use log::info;

use crate::bitmap::{to_rgba8, Bitmap};
use crate::error::SinkError;

/// Accepts finished icons.
pub trait AssetSink {
    /// Takes ownership of `bitmap` and persists it under `name`.
    fn store(&mut self, name: &str, bitmap: Bitmap) -> Result<PathBuf, SinkError>;
}

/// Writes icons as `<name>.png` into a directory.
#[derive(Debug, Clone)]
pub struct PngDirectorySink {
    directory: PathBuf,
}

impl PngDirectorySink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Destination path for an icon name.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.png", clean_file_name(name)))
    }
}

impl AssetSink for PngDirectorySink {
    fn store(&mut self, name: &str, bitmap: Bitmap) -> Result<PathBuf, SinkError> {
        fs::create_dir_all(&self.directory).map_err(|source| SinkError::Io {
            path: self.directory.clone(),
            source,
        })?;
        let path = self.path_for(name);
        to_rgba8(&bitmap).save_with_format(&path, ImageFormat::Png)?;
        info!("saved icon {} ({}x{})", path.display(), bitmap.width(), bitmap.height());
        Ok(path)
    }
}

const INVALID_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strips instance markers and characters that are not valid in file names.
pub fn clean_file_name(name: &str) -> String {
    let cleaned: String = clean_object_name(name)
        .chars()
        .filter(|c| !c.is_control() && !INVALID_FILE_CHARS.contains(c))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "icon".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Removes `(Clone)` markers left by instantiation and trims whitespace.
pub fn clean_object_name(name: &str) -> String {
    name.replace("(Clone)", "")
        .replace("(clone)", "")
        .trim()
        .to_string()
}
