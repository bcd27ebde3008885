use std::path::{Path, PathBuf};

use crate::utils::sanitize_title;

pub const PAGES_SUBDIR: &str = "pages";
pub const READER_FILENAME: &str = "leitor.html";
/// Directory-name marker the index generator keys on.
pub const CHAPTER_DIR_MARKER: &str = "_capitulo_";

/// One chapter iteration of the crawl loop. Immutable once created; the
/// title and sequence index live here as fields so nothing downstream has
/// to re-parse them out of the directory name.
#[derive(Debug, Clone)]
pub struct ChapterJob {
    pub source_url: String,
    pub sequence_index: u32,
    pub manga_title: String,
    pub output_directory: PathBuf,
}

impl ChapterJob {
    pub fn new(
        source_url: impl Into<String>,
        sequence_index: u32,
        manga_title: impl Into<String>,
        library_root: &Path,
    ) -> Self {
        let manga_title = manga_title.into();
        let dir_name = format!(
            "{}{}{}",
            sanitize_title(&manga_title),
            CHAPTER_DIR_MARKER,
            sequence_index
        );
        Self {
            source_url: source_url.into(),
            sequence_index,
            manga_title,
            output_directory: library_root.join(dir_name),
        }
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.output_directory.join(PAGES_SUBDIR)
    }

    pub fn reader_path(&self) -> PathBuf {
        self.output_directory.join(READER_FILENAME)
    }
}

/// Persisted color mode of an archived page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Opaque truecolor, stored as quality-optimized JPEG.
    Rgb,
    /// Carries an alpha or luminance-alpha channel, stored losslessly as PNG.
    WithAlpha,
}

impl PixelFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PixelFormat::Rgb => "jpg",
            PixelFormat::WithAlpha => "png",
        }
    }
}

/// A successfully archived page image. Ordinals within one chapter are
/// 1-based, gapless and follow document order; a failed fetch produces no
/// asset at all rather than a hole.
#[derive(Debug, Clone)]
pub struct PageAsset {
    pub ordinal: u32,
    pub local_path: PathBuf,
    pub pixel_format: PixelFormat,
}

impl PageAsset {
    pub fn filename(&self) -> &str {
        self.local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Terminal record of one chapter. `next_url == None` is the expected
/// end-of-crawl signal, not an error.
#[derive(Debug, Clone)]
pub struct ChapterResult {
    pub job: ChapterJob,
    pub assets: Vec<PageAsset>,
    pub next_url: Option<String>,
}

impl ChapterResult {
    pub fn archived_any(&self) -> bool {
        !self.assets.is_empty()
    }
}
