use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;
use tracing::info;

static FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("forbidden-characters pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("underscore pattern"));

const MAX_TITLE_CHARS: usize = 100;

/// Turns a page title into a directory-safe name, stable across runs:
/// forbidden characters stripped, whitespace runs collapsed to one `_`,
/// underscore runs collapsed, truncated to 100 characters.
pub fn sanitize_title(name: &str) -> String {
    let name = FORBIDDEN.replace_all(name, "");
    let name = WHITESPACE.replace_all(name.trim(), "_");
    let name = UNDERSCORES.replace_all(&name, "_");
    name.chars().take(MAX_TITLE_CHARS).collect()
}

/// Prompts for the library root. The path must be absolute and already
/// exist, otherwise the caller prints the error and performs no crawl.
pub fn prompt_library_root() -> Result<PathBuf> {
    let input = prompt_line("Output directory (absolute path): ")?;
    let path = PathBuf::from(input.trim());
    if !path.is_absolute() {
        bail!("the output path must be absolute");
    }
    if !path.exists() {
        bail!("the output path does not exist");
    }
    Ok(path)
}

pub fn prompt_chapter_count() -> Result<u32> {
    let input = prompt_line("Number of chapters to fetch: ")?;
    let count: u32 = input
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("the chapter count must be a number"))?;
    if count == 0 {
        bail!("the chapter count must be at least 1");
    }
    Ok(count)
}

pub fn prompt_start_url() -> Result<String> {
    let input = prompt_line("First chapter URL: ")?;
    let url = input.trim().to_owned();
    if url.is_empty() {
        bail!("the chapter URL must not be empty");
    }
    Ok(url)
}

fn prompt_line(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}

pub fn display_elapsed_time(duration: std::time::Duration) {
    let total_ms = duration.as_millis();

    if total_ms >= 60000 {
        let mins = total_ms / 60000;
        let secs = (total_ms % 60000) / 1000;
        info!("crawl took {}m{}s", mins, secs);
    } else if total_ms >= 1000 {
        let secs = total_ms / 1000;
        let ms_remaining = total_ms % 1000;
        info!("crawl took {}.{:03}s", secs, ms_remaining);
    } else {
        info!("crawl took {}ms", total_ms);
    }
}
