//! Library index generation: the `index.html` listing every archived
//! chapter with a cover, linking to its reader document.
//!
//! The discovery contract is filesystem-driven so the index can be rebuilt
//! at any time: a chapter entry is any directory whose name contains
//! `_capitulo_` and which holds a `leitor.html`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::crawler::job::{CHAPTER_DIR_MARKER, PAGES_SUBDIR, READER_FILENAME};

const COVER_CANDIDATE: &str = "page_02.png";
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

struct ChapterEntry {
    dir_name: String,
    display_name: String,
    chapter_number: String,
    cover: Option<String>,
    sort_key: u64,
}

/// Rebuilds `index.html` under `library_root`. Returns `false` when no
/// valid chapter directory was found (no index is written in that case).
#[instrument(skip_all)]
pub fn generate_index(library_root: &Path) -> Result<bool> {
    let mut chapters = collect_chapters(library_root)
        .with_context(|| format!("scanning {}", library_root.display()))?;

    if chapters.is_empty() {
        warn!("no valid chapter found, index not generated");
        return Ok(false);
    }

    chapters.sort_by_key(|c| c.sort_key);

    let index_path = library_root.join("index.html");
    fs::write(&index_path, index_html(library_root, &chapters))
        .with_context(|| format!("writing {}", index_path.display()))?;

    info!("index generated: {}", index_path.display());
    Ok(true)
}

fn collect_chapters(library_root: &Path) -> Result<Vec<ChapterEntry>> {
    let mut chapters = Vec::new();

    for entry in fs::read_dir(library_root)? {
        let entry = entry?;
        let path = entry.path();
        let Some(dir_name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !path.is_dir() || !dir_name.contains(CHAPTER_DIR_MARKER) {
            continue;
        }
        if !path.join(READER_FILENAME).is_file() {
            continue;
        }

        let display_name = dir_name.replace('_', " ").replace("capitulo", "Capítulo");
        let chapter_number = dir_name
            .rsplit(CHAPTER_DIR_MARKER)
            .next()
            .map(digits_of)
            .unwrap_or_default();
        let sort_key = digits_of(&dir_name).parse().unwrap_or(0);
        let cover = find_cover(&path).map(|file| format!("{dir_name}/{PAGES_SUBDIR}/{file}"));

        chapters.push(ChapterEntry {
            dir_name,
            display_name,
            chapter_number,
            cover,
            sort_key,
        });
    }

    Ok(chapters)
}

fn digits_of(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Cover preference: the literal `page_02.png`, else the second image in
/// sorted filename order, else the first, else none.
fn find_cover(chapter_dir: &Path) -> Option<String> {
    let pages_dir = chapter_dir.join(PAGES_SUBDIR);
    if pages_dir.join(COVER_CANDIDATE).is_file() {
        return Some(COVER_CANDIDATE.to_owned());
    }

    let mut pages: Vec<String> = fs::read_dir(&pages_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    pages.sort();

    match pages.len() {
        0 => None,
        1 => pages.into_iter().next(),
        _ => pages.into_iter().nth(1),
    }
}

fn index_html(library_root: &Path, chapters: &[ChapterEntry]) -> String {
    let library_name = library_root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("Biblioteca");

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Biblioteca de Mangás</title>
    <style>
        body {{
            background-color: #f8f8f8;
            color: #333;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            padding: 20px;
            margin: 0;
        }}
        .header {{
            text-align: center;
            margin-bottom: 30px;
            padding-bottom: 20px;
            border-bottom: 1px solid #e0e0e0;
        }}
        .subtitle {{
            font-size: 14px;
            color: #666;
        }}
        .chapters-grid {{
            max-width: 1200px;
            margin: 0 auto;
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(180px, 1fr));
            gap: 20px;
            padding: 10px;
        }}
        .chapter-card {{
            background: #fff;
            border-radius: 8px;
            overflow: hidden;
            box-shadow: 0 4px 12px rgba(0, 0, 0, 0.08);
            text-decoration: none;
            color: inherit;
        }}
        .cover-container {{
            height: 250px;
            overflow: hidden;
            background-color: #f0f0f0;
        }}
        .chapter-cover {{
            width: 100%;
            height: 100%;
            object-fit: cover;
        }}
        .no-cover {{
            display: flex;
            align-items: center;
            justify-content: center;
            height: 100%;
            color: #666;
            font-size: 14px;
        }}
        .chapter-info {{
            padding: 14px;
        }}
        .chapter-name {{
            font-size: 15px;
            font-weight: 500;
            margin: 0 0 3px 0;
            white-space: nowrap;
            overflow: hidden;
            text-overflow: ellipsis;
        }}
        .chapter-number {{
            font-size: 13px;
            color: #666;
            margin: 0;
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1 class="title">{library_name}</h1>
        <p class="subtitle">{count} capítulos disponíveis</p>
    </div>

    <div class="chapters-grid">
"#,
        count = chapters.len(),
    );

    for chapter in chapters {
        let cover_html = match &chapter.cover {
            Some(cover) => format!(r#"<img src="{cover}" class="chapter-cover" alt="Capa">"#),
            None => r#"<div class="no-cover">Sem imagem</div>"#.to_owned(),
        };
        let series_name = chapter
            .display_name
            .split(" Capítulo")
            .next()
            .unwrap_or(&chapter.display_name)
            .trim();

        html.push_str(&format!(
            r#"        <a href="{dir}/{reader}" class="chapter-card">
            <div class="cover-container">
                {cover_html}
            </div>
            <div class="chapter-info">
                <h3 class="chapter-name">{series_name}</h3>
                <p class="chapter-number">Capítulo {number}</p>
            </div>
        </a>
"#,
            dir = chapter.dir_name,
            reader = READER_FILENAME,
            number = chapter.chapter_number,
        ));
    }

    html.push_str("    </div>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_chapter(root: &Path, name: &str, pages: &[&str], with_reader: bool) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join(PAGES_SUBDIR)).unwrap();
        for page in pages {
            fs::write(dir.join(PAGES_SUBDIR).join(page), b"x").unwrap();
        }
        if with_reader {
            fs::write(dir.join(READER_FILENAME), b"<html></html>").unwrap();
        }
    }

    #[test]
    fn lists_only_directories_with_reader_documents() {
        let root = tempfile::tempdir().unwrap();
        make_chapter(root.path(), "Berserk_capitulo_1", &["page_001.jpg"], true);
        make_chapter(root.path(), "Berserk_capitulo_2", &[], false);
        make_chapter(root.path(), "Berserk_capitulo_3", &["page_001.jpg"], true);
        fs::create_dir(root.path().join("not_a_chapter")).unwrap();

        assert!(generate_index(root.path()).unwrap());

        let html = fs::read_to_string(root.path().join("index.html")).unwrap();
        assert!(html.contains("Berserk_capitulo_1/leitor.html"));
        assert!(!html.contains("Berserk_capitulo_2/leitor.html"));
        assert!(html.contains("Berserk_capitulo_3/leitor.html"));
        assert!(html.contains("2 capítulos disponíveis"));
    }

    #[test]
    fn orders_chapters_numerically_not_lexically() {
        let root = tempfile::tempdir().unwrap();
        make_chapter(root.path(), "One_capitulo_10", &["page_001.jpg"], true);
        make_chapter(root.path(), "One_capitulo_2", &["page_001.jpg"], true);

        assert!(generate_index(root.path()).unwrap());

        let html = fs::read_to_string(root.path().join("index.html")).unwrap();
        let second = html.find("One_capitulo_2/leitor.html").unwrap();
        let tenth = html.find("One_capitulo_10/leitor.html").unwrap();
        assert!(second < tenth);
    }

    #[test]
    fn cover_prefers_page_02_png_then_second_sorted_image() {
        let root = tempfile::tempdir().unwrap();
        make_chapter(
            root.path(),
            "A_capitulo_1",
            &["page_001.jpg", "page_02.png", "page_003.jpg"],
            true,
        );
        make_chapter(
            root.path(),
            "B_capitulo_2",
            &["page_001.jpg", "page_003.png"],
            true,
        );
        make_chapter(root.path(), "C_capitulo_3", &["page_001.jpg"], true);
        make_chapter(root.path(), "D_capitulo_4", &[], true);

        assert!(generate_index(root.path()).unwrap());

        let html = fs::read_to_string(root.path().join("index.html")).unwrap();
        assert!(html.contains("A_capitulo_1/pages/page_02.png"));
        assert!(html.contains("B_capitulo_2/pages/page_003.png"));
        assert!(html.contains("C_capitulo_3/pages/page_001.jpg"));
        assert!(html.contains("Sem imagem"));
    }

    #[test]
    fn empty_library_produces_no_index() {
        let root = tempfile::tempdir().unwrap();
        assert!(!generate_index(root.path()).unwrap());
        assert!(!root.path().join("index.html").exists());
    }
}
