//! End-to-end crawl behavior against a stub render session and a local
//! image host.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use manga_fetch::crawler::MangaCrawler;
use manga_fetch::error::RenderError;
use manga_fetch::render::Renderer;
use manga_fetch::index;

/// Canned render session: a map from chapter URL to the markup the real
/// browser would have produced. The live-DOM next-button never resolves,
/// which forces the navigator through its static-markup fallback.
struct StubRenderer {
    pages: HashMap<String, String>,
}

impl StubRenderer {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, markup)| ((*url).to_owned(), markup.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| RenderError::Navigation {
                url: url.to_owned(),
                reason: "unknown page".to_owned(),
            })
    }

    async fn wait_for_link(&self, _selector: &str, _timeout: Duration) -> Option<String> {
        None
    }

    async fn close(self) {}
}

fn chapter_page(title: &str, image_urls: &[String], next_url: Option<&str>) -> String {
    let images: String = image_urls
        .iter()
        .map(|url| format!(r#"<img src="{url}">"#))
        .collect();
    let next = next_url
        .map(|url| format!(r#"<a class="next-chapter-btn" href="{url}">Próximo</a>"#))
        .unwrap_or_default();
    format!(
        "<html><head><title>{title} | MangaSite</title></head><body>\
         <div class=\"chapter-image-container\">{images}</div>{next}</body></html>"
    )
}

fn png_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

async fn serve_image(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .mount(server)
        .await;
}

fn page_filenames(pages_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(pages_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

fn crawler(renderer: StubRenderer) -> MangaCrawler<StubRenderer> {
    MangaCrawler::new(renderer)
        .unwrap()
        .with_chapter_delay(Duration::ZERO)
}

#[tokio::test]
async fn empty_chapter_is_skipped_but_crawl_continues() {
    let server = MockServer::start().await;
    serve_image(&server, "/p1.png").await;
    serve_image(&server, "/p3.png").await;

    let ch1 = "https://site.example/manga/ch-1";
    let ch2 = "https://site.example/manga/ch-2";
    let ch3 = "https://site.example/manga/ch-3";
    let renderer = StubRenderer::new(&[
        (
            ch1,
            chapter_page("Berserk 1", &[format!("{}/p1.png", server.uri())], Some(ch2)),
        ),
        (ch2, chapter_page("Berserk 2", &[], Some(ch3))),
        (
            ch3,
            chapter_page("Berserk 3", &[format!("{}/p3.png", server.uri())], None),
        ),
    ]);

    let root = tempfile::tempdir().unwrap();
    let summary = crawler(renderer)
        .run(ch1, 3, root.path())
        .await
        .unwrap();

    assert_eq!(summary.chapters_attempted, 3);
    assert_eq!(summary.chapters_archived, 2);

    let dir1 = root.path().join("Berserk_1_capitulo_1");
    let dir2 = root.path().join("Berserk_2_capitulo_2");
    let dir3 = root.path().join("Berserk_3_capitulo_3");
    assert!(dir1.join("leitor.html").is_file());
    assert!(dir1.join("pages/page_001.jpg").is_file());
    // the failed chapter gets no reader entry but the crawl still followed
    // its next link
    assert!(dir2.is_dir());
    assert!(!dir2.join("leitor.html").exists());
    assert!(dir3.join("leitor.html").is_file());

    assert!(index::generate_index(root.path()).unwrap());
    let html = std::fs::read_to_string(root.path().join("index.html")).unwrap();
    assert!(html.contains("Berserk_1_capitulo_1/leitor.html"));
    assert!(!html.contains("Berserk_2_capitulo_2/leitor.html"));
    assert!(html.contains("Berserk_3_capitulo_3/leitor.html"));
}

#[tokio::test]
async fn failed_downloads_leave_no_gaps_in_ordinals() {
    let server = MockServer::start().await;
    serve_image(&server, "/a.png").await;
    // /b.png is not mounted and 404s
    serve_image(&server, "/c.png").await;

    let ch1 = "https://site.example/manga/ch-1";
    let renderer = StubRenderer::new(&[(
        ch1,
        chapter_page(
            "Berserk",
            &[
                format!("{}/a.png", server.uri()),
                format!("{}/b.png", server.uri()),
                format!("{}/c.png", server.uri()),
            ],
            None,
        ),
    )]);

    let root = tempfile::tempdir().unwrap();
    let summary = crawler(renderer)
        .run(ch1, 1, root.path())
        .await
        .unwrap();

    assert_eq!(summary.chapters_archived, 1);
    let pages_dir = root.path().join("Berserk_capitulo_1/pages");
    assert_eq!(
        page_filenames(&pages_dir),
        vec!["page_001.jpg".to_owned(), "page_002.jpg".to_owned()]
    );
}

#[tokio::test]
async fn missing_next_link_ends_the_crawl_without_error() {
    let server = MockServer::start().await;
    serve_image(&server, "/p1.png").await;

    let ch1 = "https://site.example/manga/ch-1";
    let renderer = StubRenderer::new(&[(
        ch1,
        chapter_page("Berserk", &[format!("{}/p1.png", server.uri())], None),
    )]);

    let root = tempfile::tempdir().unwrap();
    let summary = crawler(renderer)
        .run(ch1, 5, root.path())
        .await
        .unwrap();

    assert_eq!(summary.chapters_attempted, 1);
    assert_eq!(summary.chapters_archived, 1);
}

#[tokio::test]
async fn self_referential_next_link_ends_the_crawl() {
    let server = MockServer::start().await;
    serve_image(&server, "/p1.png").await;

    let ch1 = "https://site.example/manga/ch-1";
    let renderer = StubRenderer::new(&[(
        ch1,
        chapter_page("Berserk", &[format!("{}/p1.png", server.uri())], Some(ch1)),
    )]);

    let root = tempfile::tempdir().unwrap();
    let summary = crawler(renderer)
        .run(ch1, 3, root.path())
        .await
        .unwrap();

    assert_eq!(summary.chapters_attempted, 1);
}

#[tokio::test]
async fn render_failure_aborts_the_run() {
    let server = MockServer::start().await;
    serve_image(&server, "/p1.png").await;

    let ch1 = "https://site.example/manga/ch-1";
    let ch2 = "https://site.example/manga/ch-2";
    // ch2 is unknown to the stub, so its render fails
    let renderer = StubRenderer::new(&[(
        ch1,
        chapter_page("Berserk", &[format!("{}/p1.png", server.uri())], Some(ch2)),
    )]);

    let root = tempfile::tempdir().unwrap();
    let result = crawler(renderer).run(ch1, 3, root.path()).await;

    assert!(result.is_err());
    // the chapter archived before the abort stays on disk
    assert!(
        root.path()
            .join("Berserk_capitulo_1/leitor.html")
            .is_file()
    );
}

#[tokio::test]
async fn chapter_limit_stops_following_next_links() {
    let server = MockServer::start().await;
    serve_image(&server, "/p1.png").await;
    serve_image(&server, "/p2.png").await;

    let ch1 = "https://site.example/manga/ch-1";
    let ch2 = "https://site.example/manga/ch-2";
    let ch3 = "https://site.example/manga/ch-3";
    let renderer = StubRenderer::new(&[
        (
            ch1,
            chapter_page("Berserk 1", &[format!("{}/p1.png", server.uri())], Some(ch2)),
        ),
        (
            ch2,
            chapter_page("Berserk 2", &[format!("{}/p2.png", server.uri())], Some(ch3)),
        ),
    ]);

    let root = tempfile::tempdir().unwrap();
    let summary = crawler(renderer)
        .run(ch1, 2, root.path())
        .await
        .unwrap();

    assert_eq!(summary.chapters_attempted, 2);
    assert!(!root.path().join("Berserk_3_capitulo_3").exists());
}
