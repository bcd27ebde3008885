use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use reqwest::{Client, header};
use tokio::fs;
use tracing::{debug, instrument};

use crate::crawler::job::{PageAsset, PixelFormat};
use crate::error::FetchError;

/// Many sources reject requests that do not look like a browser.
const USER_AGENT: &str = "Mozilla/5.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const JPEG_QUALITY: u8 = 85;

/// Downloads one page image, normalizes its pixel format and publishes it
/// under its deterministic filename.
pub struct AssetFetcher {
    client: Client,
}

impl AssetFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches `url` with the chapter page as referer and persists it as
    /// `page_NNN.<ext>` under `pages_dir`. The file is written to a
    /// temporary name and renamed into place, so a crash mid-write never
    /// leaves a truncated file under the final name.
    #[instrument(skip(self, pages_dir))]
    pub async fn fetch(
        &self,
        url: &str,
        chapter_referer: &str,
        ordinal: u32,
        pages_dir: &Path,
    ) -> Result<PageAsset, FetchError> {
        let response = self
            .client
            .get(url)
            .header(header::REFERER, chapter_referer)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| FetchError::Request {
                url: url.to_owned(),
                source,
            })?;

        let body: Bytes = response.bytes().await.map_err(|source| FetchError::Request {
            url: url.to_owned(),
            source,
        })?;

        let image = image::load_from_memory(&body).map_err(|source| FetchError::Image {
            url: url.to_owned(),
            source,
        })?;

        let (encoded, pixel_format) = encode(&image).map_err(|source| FetchError::Image {
            url: url.to_owned(),
            source,
        })?;

        let filename = format!("page_{:03}.{}", ordinal, pixel_format.extension());
        let final_path = pages_dir.join(&filename);
        let tmp_path = pages_dir.join(format!("{filename}.part"));

        fs::write(&tmp_path, &encoded)
            .await
            .map_err(|source| FetchError::Persist {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|source| FetchError::Persist {
                path: final_path.clone(),
                source,
            })?;

        debug!("page saved: {}", final_path.display());
        Ok(PageAsset {
            ordinal,
            local_path: final_path,
            pixel_format,
        })
    }
}

/// Alpha-carrying modes keep a lossless container; everything else is
/// flattened to RGB8 and stored lossy. Palette sources are already expanded
/// to truecolor by the decoder.
fn encode(image: &DynamicImage) -> image::ImageResult<(Vec<u8>, PixelFormat)> {
    let mut buffer = Cursor::new(Vec::new());
    if image.color().has_alpha() {
        image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok((buffer.into_inner(), PixelFormat::WithAlpha))
    } else {
        let rgb = image.to_rgb8();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))?;
        Ok((buffer.into_inner(), PixelFormat::Rgb))
    }
}
