//! Chapter reader generation: the static `leitor.html` that displays one
//! chapter's archived pages in ordinal order.

use anyhow::Result;
use tokio::fs;
use tracing::{info, instrument};

use crate::crawler::job::{ChapterJob, PAGES_SUBDIR, PageAsset};

#[instrument(skip_all)]
pub async fn write_reader(job: &ChapterJob, assets: &[PageAsset]) -> Result<()> {
    let path = job.reader_path();
    fs::write(&path, reader_html(job, assets)).await?;
    info!("reader generated: {}", path.display());
    Ok(())
}

fn reader_html(job: &ChapterJob, assets: &[PageAsset]) -> String {
    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title} - Capítulo {number}</title>
<style>
    body {{
        margin: 0;
        padding: 0;
        background-color: #0e0e0e;
        color: #ccc;
        font-family: Arial, sans-serif;
    }}
    .header {{
        background-color: rgba(0,0,0,0.7);
        padding: 5px 10px;
        font-size: 0.9rem;
        position: sticky;
        top: 0;
        display: flex;
        justify-content: space-between;
        align-items: center;
    }}
    .header a {{
        color: #999;
        text-decoration: none;
        font-size: 0.8rem;
    }}
    .page-container {{
        max-width: 1000px;
        margin: auto;
        padding: 0;
    }}
    .manga-page {{
        width: 100%;
        height: auto;
        display: block;
        margin: 0 auto;
    }}
    .page-number {{
        font-size: 0.7rem;
        color: #555;
        text-align: center;
        margin: 5px 0;
    }}
</style>
</head>
<body>

<div class="header">
    <a href="../index.html">← Voltar</a>
    <div>{title} - Cap. {number}</div>
</div>

<div class="page-container">
"#,
        title = job.manga_title,
        number = job.sequence_index,
    );

    for asset in assets {
        html.push_str(&format!(
            r#"    <div class="page">
        <img class="manga-page" src="{pages}/{file}" alt="Página {ordinal}" loading="lazy">
    </div>
    <div class="page-number">Página {ordinal}</div>
"#,
            pages = PAGES_SUBDIR,
            file = asset.filename(),
            ordinal = asset.ordinal,
        ));
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}
