pub mod fetcher;
pub mod job;
pub mod locator;
pub mod navigator;
pub mod pipeline;

pub use fetcher::AssetFetcher;
pub use job::{ChapterJob, ChapterResult, PageAsset, PixelFormat};
pub use navigator::Navigator;
pub use pipeline::ChapterPipeline;

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tokio::fs;
use tokio::time::sleep;
use tracing::{error, info, instrument};

use crate::render::Renderer;

/// Fixed pause between chapters, to stay polite with the source.
const CHAPTER_DELAY: Duration = Duration::from_secs(2);

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector"));

const FALLBACK_TITLE: &str = "sem_titulo";

#[derive(Debug, Default, Clone, Copy)]
pub struct CrawlSummary {
    /// Chapters that rendered and went through the pipeline.
    pub chapters_attempted: u32,
    /// Chapters that archived at least one page.
    pub chapters_archived: u32,
}

/// Drives the whole crawl: render a chapter, run the pipeline on it, follow
/// the next-chapter link, until the configured count is reached or no next
/// chapter exists. Owns the render session for its entire lifetime and
/// releases it exactly once on every exit path.
pub struct MangaCrawler<R: Renderer> {
    renderer: R,
    pipeline: ChapterPipeline,
    chapter_delay: Duration,
}

impl<R: Renderer> MangaCrawler<R> {
    pub fn new(renderer: R) -> Result<Self> {
        Ok(Self {
            renderer,
            pipeline: ChapterPipeline::new()?,
            chapter_delay: CHAPTER_DELAY,
        })
    }

    pub fn with_chapter_delay(mut self, delay: Duration) -> Self {
        self.chapter_delay = delay;
        self
    }

    /// Processes up to `chapter_count` chapters starting from `start_url`.
    /// A render failure aborts the run and propagates after the session is
    /// released; a missing next-chapter link ends it normally.
    #[instrument(skip_all, fields(chapters = chapter_count))]
    pub async fn run(
        self,
        start_url: &str,
        chapter_count: u32,
        library_root: &Path,
    ) -> Result<CrawlSummary> {
        let mut summary = CrawlSummary::default();
        let mut current_url = start_url.to_owned();

        for index in 1..=chapter_count {
            info!("=== processing chapter {index} ===");

            let markup = match self.renderer.render(&current_url).await {
                Ok(markup) => markup,
                Err(e) => {
                    error!("chapter {index} aborted the crawl: {e}");
                    self.renderer.close().await;
                    return Err(e.into());
                }
            };
            summary.chapters_attempted += 1;

            let title = page_title(&markup);
            let job = ChapterJob::new(current_url.clone(), index, title, library_root);
            if let Err(e) = fs::create_dir_all(job.pages_dir()).await {
                self.renderer.close().await;
                return Err(e).context(format!("creating {}", job.output_directory.display()));
            }

            let result = self.pipeline.run(&self.renderer, &job, &markup).await;
            if result.archived_any() {
                summary.chapters_archived += 1;
            }

            match result.next_url {
                Some(next) if index < chapter_count => {
                    current_url = next;
                    sleep(self.chapter_delay).await;
                }
                Some(_) => info!("chapter limit reached"),
                None => {
                    info!("no next chapter, ending the crawl");
                    break;
                }
            }
        }

        self.renderer.close().await;
        info!(
            "crawl finished: {}/{} chapters archived",
            summary.chapters_archived, summary.chapters_attempted
        );
        Ok(summary)
    }
}

/// The chapter page title is `<series> | <site name>`; the part before the
/// separator names the chapter directory.
fn page_title(markup: &str) -> String {
    let document = Html::parse_document(markup);
    document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>())
        .and_then(|t| t.split('|').next().map(|s| s.trim().to_owned()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_owned())
}
