use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use crate::render::IMAGE_CONTAINER_SELECTOR;

static CHAPTER_IMAGES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(IMAGE_CONTAINER_SELECTOR).expect("chapter image selector"));

/// One entry of a multi-resolution descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ImageCandidate {
    url: String,
    declared_width: Option<u32>,
}

/// Resolves the ordered image URLs of a chapter page, in document order.
///
/// Per image element: a `srcset`/`data-srcset` descriptor collapses to its
/// highest-width entry; otherwise the eager `src` wins over the lazy-load
/// `data-src`; a slot yielding no URL is skipped without aborting the rest.
/// An empty result is a valid outcome, it means the page has no images.
pub fn extract_image_urls(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    let mut urls = Vec::new();

    for img in document.select(&CHAPTER_IMAGES) {
        let descriptor = img
            .value()
            .attr("srcset")
            .or_else(|| img.value().attr("data-srcset"))
            .filter(|s| !s.trim().is_empty());

        if let Some(descriptor) = descriptor {
            if let Some(best) = highest_resolution(descriptor) {
                urls.push(best);
                continue;
            }
        }

        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .filter(|s| !s.trim().is_empty());

        match src {
            Some(src) => urls.push(src.trim().to_owned()),
            None => debug!("image slot without a usable source, skipping"),
        }
    }

    urls
}

fn parse_srcset(descriptor: &str) -> Vec<ImageCandidate> {
    descriptor
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next()?;
            let declared_width = parts
                .next()
                .and_then(|token| token.strip_suffix('w'))
                .and_then(|digits| digits.parse().ok());
            Some(ImageCandidate {
                url: url.to_owned(),
                declared_width,
            })
        })
        .collect()
}

fn highest_resolution(descriptor: &str) -> Option<String> {
    let candidates = parse_srcset(descriptor);

    // strict comparison keeps the first occurrence on width ties
    let mut best: Option<(u32, &str)> = None;
    for candidate in &candidates {
        if let Some(width) = candidate.declared_width {
            if best.is_none_or(|(w, _)| width > w) {
                best = Some((width, candidate.url.as_str()));
            }
        }
    }

    match best {
        Some((_, url)) => Some(url.to_owned()),
        // no width data at all: take the single available URL
        None => candidates.first().map(|c| c.url.clone()),
    }
}
