use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::render::Renderer;

/// The source marks its next-chapter button with this class.
pub const NEXT_LINK_SELECTOR: &str = "a.next-chapter-btn";

const NEXT_LINK_TIMEOUT: Duration = Duration::from_secs(10);

static NEXT_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)pr[óo]ximo|next").expect("next-link text pattern"));
static NEXT_BUTTON: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(NEXT_LINK_SELECTOR).expect("next-button selector"));
static ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("anchor selector"));

/// Locates the link to the next chapter. Failure here is never fatal, it is
/// the expected end-of-crawl signal.
pub struct Navigator;

impl Navigator {
    /// Primary strategy: wait for the next-chapter button to become
    /// actionable in the live DOM. Falls back to the static markup when the
    /// button never shows up.
    pub async fn find_next<R: Renderer>(
        &self,
        renderer: &R,
        markup: &str,
        current_url: &str,
    ) -> Option<String> {
        if let Some(href) = renderer.wait_for_link(NEXT_LINK_SELECTOR, NEXT_LINK_TIMEOUT).await {
            if let Some(next) = resolve(&href, current_url) {
                info!("next chapter found: {next}");
                return Some(next);
            }
            return None;
        }

        debug!("next-chapter button not actionable, re-parsing the static markup");
        self.find_next_in_markup(markup, current_url)
    }

    /// Fallback strategy: an anchor carrying the designated class, or an
    /// anchor whose visible text reads like "next" in Portuguese or English.
    pub fn find_next_in_markup(&self, markup: &str, current_url: &str) -> Option<String> {
        let document = Html::parse_document(markup);

        let by_class = document
            .select(&NEXT_BUTTON)
            .find_map(|a| a.value().attr("href"));

        let href = by_class.or_else(|| {
            document
                .select(&ANCHORS)
                .find(|a| a.text().any(|t| NEXT_TEXT.is_match(t)))
                .and_then(|a| a.value().attr("href"))
        })?;

        let next = resolve(href, current_url)?;
        info!("next chapter found in markup: {next}");
        Some(next)
    }
}

/// Joins `href` against the current chapter URL. A link resolving back to
/// the current chapter means "no next chapter".
fn resolve(href: &str, current_url: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(current_url) {
        Ok(base) => {
            let resolved = base.join(href).ok()?;
            if resolved == base {
                debug!("next link points back to the current chapter");
                return None;
            }
            Some(resolved.to_string())
        }
        Err(_) => (href != current_url).then(|| href.to_owned()),
    }
}
