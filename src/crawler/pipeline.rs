use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::crawler::fetcher::AssetFetcher;
use crate::crawler::job::{ChapterJob, ChapterResult};
use crate::crawler::locator;
use crate::crawler::navigator::Navigator;
use crate::reader;
use crate::render::Renderer;

/// Orchestrates one chapter: locate the images, archive them one by one,
/// generate the reader document, determine the next chapter.
pub struct ChapterPipeline {
    fetcher: AssetFetcher,
    navigator: Navigator,
}

impl ChapterPipeline {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fetcher: AssetFetcher::new()?,
            navigator: Navigator,
        })
    }

    /// Total: chapter-level failures never escape, they come back as a
    /// result with zero assets. Per-image failures are logged and the
    /// remaining images still attempt. Ordinals are assigned as fetches
    /// succeed, so the archived sequence is gapless even when downloads
    /// fail in the middle.
    #[instrument(skip_all, fields(chapter = job.sequence_index))]
    pub async fn run<R: Renderer>(
        &self,
        renderer: &R,
        job: &ChapterJob,
        markup: &str,
    ) -> ChapterResult {
        let urls = locator::extract_image_urls(markup);
        let mut assets = Vec::new();

        if urls.is_empty() {
            warn!("no images found on the chapter page");
        } else {
            info!("found {} images in the chapter", urls.len());
            let pages_dir = job.pages_dir();
            for url in &urls {
                let ordinal = assets.len() as u32 + 1;
                match self
                    .fetcher
                    .fetch(url, &job.source_url, ordinal, &pages_dir)
                    .await
                {
                    Ok(asset) => assets.push(asset),
                    Err(e) => warn!("download failed: {e}"),
                }
            }
            info!(
                "archived {}/{} pages in {}",
                assets.len(),
                urls.len(),
                pages_dir.display()
            );
        }

        if assets.is_empty() {
            warn!(
                "chapter {} produced no pages, skipping reader generation",
                job.sequence_index
            );
        } else if let Err(e) = reader::write_reader(job, &assets).await {
            warn!("reader generation failed: {e}");
        }

        // even a failed chapter still tries to hand the crawl the next URL
        let next_url = self.navigator.find_next(renderer, markup, &job.source_url).await;

        ChapterResult {
            job: job.clone(),
            assets,
            next_url,
        }
    }
}
