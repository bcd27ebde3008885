use std::time::Instant;

use anyhow::Result;

use manga_fetch::crawler::MangaCrawler;
use manga_fetch::render::ChromeSession;
use manga_fetch::{index, logger, utils};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();

    println!("\n=== manga-fetch ===");
    let library_root = match utils::prompt_library_root() {
        Ok(path) => path,
        Err(e) => {
            println!("error: {e}");
            return Ok(());
        }
    };
    let chapter_count = match utils::prompt_chapter_count() {
        Ok(count) => count,
        Err(e) => {
            println!("error: {e}");
            return Ok(());
        }
    };
    let start_url = match utils::prompt_start_url() {
        Ok(url) => url,
        Err(e) => {
            println!("error: {e}");
            return Ok(());
        }
    };

    let renderer = ChromeSession::launch().await?;
    let crawler = MangaCrawler::new(renderer)?;

    let start = Instant::now();
    match crawler.run(&start_url, chapter_count, &library_root).await {
        Ok(summary) => {
            utils::display_elapsed_time(start.elapsed());
            println!(
                "✅ {} of {} chapters archived in {}",
                summary.chapters_archived,
                summary.chapters_attempted,
                library_root.display()
            );
        }
        Err(e) => println!("crawl aborted: {e:#}"),
    }

    // chapters archived before an abort still make it into the library
    match index::generate_index(&library_root) {
        Ok(true) => {}
        Ok(false) => println!("no chapters available for the library index"),
        Err(e) => println!("index generation failed: {e:#}"),
    }

    Ok(())
}
