/// Locally stored images that have not yet been confirmed by the archive
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::utils::image_file_name;

#[derive(Debug, Clone)]
pub struct ImageBacklog {
    dir: PathBuf,
}

impl ImageBacklog {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where an image captured at `at` is stored
    pub fn path_for(&self, at: &OffsetDateTime) -> PathBuf {
        self.dir.join(image_file_name(at))
    }

    /// All images, oldest first
    ///
    /// Names encode the capture time, so lexical order is creation order.
    pub fn list_oldest_first(&self) -> io::Result<Vec<PathBuf>> {
        let mut images = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_jpeg = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("jpg"))
                .unwrap_or(false);
            if is_jpeg && path.is_file() {
                images.push(path);
            }
        }
        images.sort();
        Ok(images)
    }

    /// Remove an image whose transfer was confirmed
    pub fn remove(&self, image: &Path) -> io::Result<()> {
        fs::remove_file(image)
    }
}
