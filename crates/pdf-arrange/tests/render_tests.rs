use lopdf::{Dictionary, Document, Object};
use pdf_arrange::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn create_test_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for &(width, height) in sizes {
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(sizes.len() as i64)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut writer = Vec::new();
    doc.save_to(&mut writer).unwrap();
    writer
}

#[test]
fn test_outline_renderer_counts_pages() {
    let bytes = create_test_pdf(&[(612, 792), (842, 595)]);
    let document = OutlineRenderer::open(&bytes).unwrap();
    assert_eq!(document.page_count(), 2);
    assert_eq!(document.page_size(2).unwrap(), (842.0, 595.0));
}

#[test]
fn test_outline_renderer_scales_media_box() {
    let bytes = create_test_pdf(&[(612, 792), (842, 595)]);
    let document = OutlineRenderer::open(&bytes).unwrap();

    let thumb = document.render_page(1, 0.5).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (306, 396));
    assert_eq!(
        thumb.as_rgba_bytes().len(),
        (thumb.width() * thumb.height() * 4) as usize
    );

    let landscape = document.render_page(2, 1.0).unwrap();
    assert!(landscape.width() > landscape.height());
}

#[test]
fn test_outline_renderer_errors() {
    assert!(matches!(
        OutlineRenderer::open(b"garbage"),
        Err(ArrangeError::LoadFailure(_))
    ));

    let bytes = create_test_pdf(&[(612, 792)]);
    let document = OutlineRenderer::open(&bytes).unwrap();
    assert!(matches!(
        document.render_page(5, 1.0),
        Err(ArrangeError::RenderFailure(_))
    ));
    assert!(matches!(
        document.render_page(0, 1.0),
        Err(ArrangeError::RenderFailure(_))
    ));
}

#[test]
fn test_with_document_reports_load_failure() {
    let mut visited = false;
    let result = OutlineRenderer.with_document(b"garbage", &mut |_: &dyn RenderDocument| {
        visited = true;
        Ok(())
    });
    assert!(matches!(result, Err(ArrangeError::LoadFailure(_))));
    assert!(!visited);
}

#[tokio::test]
async fn test_read_source_and_write_output() {
    use tempfile::TempDir;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scan.pdf");
    let bytes = create_test_pdf(&[(612, 792)]);

    write_output(&bytes, &path).await.unwrap();
    let source = read_source(&path).await.unwrap();

    assert_eq!(source.name, "scan.pdf");
    assert_eq!(source.bytes, bytes);
}

#[tokio::test]
async fn test_render_thumbnails_reports_each_page() {
    let bytes: Arc<[u8]> = create_test_pdf(&[(612, 792), (612, 792), (842, 595)]).into();
    let mut seen = Vec::new();
    let mut reporter = |p: Progress| seen.push(p.percent());

    let rendered = render_thumbnails(
        Arc::new(OutlineRenderer),
        bytes,
        0.25,
        &mut reporter,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(rendered.page_count, 3);
    assert_eq!(rendered.thumbnails.len(), 3);
    assert_eq!(rendered.thumbnails[0].width(), 153);
    assert_eq!(seen, vec![33, 67, 100]);
}

#[tokio::test]
async fn test_render_thumbnails_cancelled() {
    let bytes: Arc<[u8]> = create_test_pdf(&[(612, 792), (612, 792), (612, 792)]).into();
    let token = CancellationToken::new();
    let observer = token.clone();
    let mut reporter = |p: Progress| {
        if p.current == 1 {
            observer.cancel();
        }
    };

    let service: Arc<dyn PageRenderingService> = Arc::new(OutlineRenderer);
    let result = render_thumbnails(service, bytes, 0.25, &mut reporter, &token).await;
    assert!(matches!(result, Err(ArrangeError::Cancelled)));
}

#[tokio::test]
async fn test_render_thumbnails_bad_bytes() {
    let result = render_thumbnails(
        Arc::new(OutlineRenderer),
        Arc::from(&b"%PDF-broken"[..]),
        1.0,
        &mut NoProgress,
        &CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(ArrangeError::LoadFailure(_))));
}

/// Counts how often a document is parsed and how many pages are drawn
#[derive(Default)]
struct CountingRenderer {
    opens: AtomicUsize,
    pages: AtomicUsize,
}

struct CountingDocument<'a> {
    inner: &'a dyn RenderDocument,
    pages: &'a AtomicUsize,
}

impl RenderDocument for CountingDocument<'_> {
    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn render_page(&self, page_number: u32, scale: f32) -> Result<RasterImage> {
        self.pages.fetch_add(1, Ordering::SeqCst);
        self.inner.render_page(page_number, scale)
    }
}

impl PageRenderingService for CountingRenderer {
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn RenderDocument) -> Result<()>,
    ) -> Result<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        OutlineRenderer.with_document(bytes, &mut |inner: &dyn RenderDocument| {
            visit(&CountingDocument {
                inner,
                pages: &self.pages,
            })
        })
    }
}

#[tokio::test]
async fn test_render_thumbnails_parses_document_once() {
    let bytes: Arc<[u8]> = create_test_pdf(&[(612, 792); 6]).into();
    let service = Arc::new(CountingRenderer::default());

    let rendered = render_thumbnails(
        Arc::clone(&service),
        bytes,
        0.1,
        &mut NoProgress,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(rendered.page_count, 6);
    assert_eq!(service.opens.load(Ordering::SeqCst), 1);
    assert_eq!(service.pages.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_render_thumbnails_stops_drawing_after_cancel() {
    let bytes: Arc<[u8]> = create_test_pdf(&[(612, 792); 5]).into();
    let service = Arc::new(CountingRenderer::default());
    let token = CancellationToken::new();
    let observer = token.clone();
    let mut reporter = |p: Progress| {
        if p.current == 2 {
            observer.cancel();
        }
    };

    let result = render_thumbnails(Arc::clone(&service), bytes, 0.1, &mut reporter, &token).await;

    assert!(matches!(result, Err(ArrangeError::Cancelled)));
    assert_eq!(service.pages.load(Ordering::SeqCst), 2);
}
