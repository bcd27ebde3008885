use std::path::PathBuf;

use thiserror::Error;

/// Chapter page failed to render. Chapter-fatal: the crawl loop aborts the
/// whole run when this surfaces, it is never retried.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {timeout_secs}s waiting for `{selector}` on {url}")]
    ElementTimeout {
        url: String,
        selector: String,
        timeout_secs: u64,
    },

    #[error("could not read the rendered document for {url}: {reason}")]
    Content { url: String, reason: String },
}

/// A single page image could not be archived. Recovered locally: the
/// pipeline logs it and moves on to the remaining images of the chapter.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("image data from {url} is unusable: {source}")]
    Image {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("could not persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
