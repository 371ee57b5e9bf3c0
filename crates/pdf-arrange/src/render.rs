//! Page rendering service
//!
//! Rasterization is delegated to whatever implements
//! [`PageRenderingService`]. The GUI plugs in pdfium; [`OutlineRenderer`]
//! only reads page geometry with `lopdf` and draws blank page outlines,
//! which is enough for headless use and tests.

use crate::backend::page_attribute;
use crate::cancel::{CancellationToken, Progress, ProgressReporter, report_quietly};
use crate::constants::DEFAULT_PAGE_DIMENSIONS;
use crate::types::*;
use image::{Rgba, RgbaImage};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A rendered page
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    image: RgbaImage,
}

impl RasterImage {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Unmultiplied RGBA, row-major
    pub fn as_rgba_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// A document opened by a [`PageRenderingService`]
pub trait RenderDocument {
    fn page_count(&self) -> usize;

    /// Rasterize page `page_number` (1-based) at `scale` (1.0 = 72 dpi)
    fn render_page(&self, page_number: u32, scale: f32) -> Result<RasterImage>;
}

pub trait PageRenderingService: Send + Sync {
    /// Parse `bytes` once and hand the open document to `visit`.
    ///
    /// The document only lives for the call, so renderers whose handles
    /// borrow a library instance can keep them on the stack.
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn RenderDocument) -> Result<()>,
    ) -> Result<()>;
}

/// A document opened for display, with one thumbnail per page
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub page_count: usize,
    pub thumbnails: Vec<RasterImage>,
}

/// Open `bytes` and render every page at `scale`, one page at a time.
///
/// The document is parsed once on a blocking thread. The token is checked
/// before each page, and the next page is only started after `reporter`
/// has seen the previous one. A cancelled or failed load returns an error
/// and nothing else, so the caller keeps whatever it was showing before.
pub async fn render_thumbnails<S, R>(
    service: Arc<S>,
    bytes: Arc<[u8]>,
    scale: f32,
    reporter: &mut R,
    token: &CancellationToken,
) -> Result<RenderedDocument>
where
    S: PageRenderingService + ?Sized + 'static,
    R: ProgressReporter,
{
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<Progress>();
    let (resume_tx, mut resume_rx) = mpsc::unbounded_channel::<()>();
    let token = token.clone();

    let render = tokio::task::spawn_blocking(move || {
        let mut thumbnails = Vec::new();
        service.with_document(&bytes, &mut |doc: &dyn RenderDocument| {
            let total = doc.page_count();
            log::debug!("Rendering {} thumbnail(s)", total);

            for page_number in 1..=total as u32 {
                // Wait for the previous page to be reported
                if page_number > 1 && resume_rx.blocking_recv().is_none() {
                    return Err(ArrangeError::Cancelled);
                }
                if token.is_cancelled() {
                    log::info!("Loading cancelled after {}/{} page(s)", thumbnails.len(), total);
                    return Err(ArrangeError::Cancelled);
                }

                thumbnails.push(doc.render_page(page_number, scale)?);
                // The receiver only goes away with the caller
                let _ = progress_tx.send(Progress::new(page_number as usize, total));
            }
            Ok(())
        })?;
        Ok::<_, ArrangeError>(thumbnails)
    });

    while let Some(progress) = progress_rx.recv().await {
        report_quietly(&mut *reporter, progress);
        let _ = resume_tx.send(());
    }

    let thumbnails = render.await??;
    Ok(RenderedDocument {
        page_count: thumbnails.len(),
        thumbnails,
    })
}

/// Draws each page as an empty sheet of the right size
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineRenderer;

const PAGE_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const PAGE_EDGE: Rgba<u8> = Rgba([160, 160, 160, 255]);

impl OutlineRenderer {
    /// Parse a document for repeated page queries
    pub fn open(bytes: &[u8]) -> Result<OutlineDocument> {
        let doc = Document::load_mem(bytes).map_err(|e| ArrangeError::LoadFailure(e.to_string()))?;
        let pages = doc.get_pages();
        Ok(OutlineDocument { doc, pages })
    }
}

impl PageRenderingService for OutlineRenderer {
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn RenderDocument) -> Result<()>,
    ) -> Result<()> {
        let document = Self::open(bytes)?;
        visit(&document)
    }
}

/// A parsed document whose pages are drawn as outlines
pub struct OutlineDocument {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl OutlineDocument {
    /// Page size in points, from the (possibly inherited) MediaBox
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32)> {
        let page_id = *self.pages.get(&page_number).ok_or_else(|| {
            ArrangeError::RenderFailure(format!("page {page_number} does not exist"))
        })?;

        Ok(page_attribute(&self.doc, page_id, b"MediaBox")
            .and_then(|media_box| media_box_size(&media_box))
            .unwrap_or(DEFAULT_PAGE_DIMENSIONS))
    }
}

impl RenderDocument for OutlineDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render_page(&self, page_number: u32, scale: f32) -> Result<RasterImage> {
        let (width_pt, height_pt) = self.page_size(page_number)?;

        let width = ((width_pt * scale).round() as u32).max(1);
        let height = ((height_pt * scale).round() as u32).max(1);

        let image = RgbaImage::from_fn(width, height, |x, y| {
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                PAGE_EDGE
            } else {
                PAGE_FILL
            }
        });
        Ok(RasterImage::new(image))
    }
}

/// Width and height of a `[llx lly urx ury]` box
fn media_box_size(media_box: &Object) -> Option<(f32, f32)> {
    let values = media_box.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let nums: Vec<f32> = values.iter().filter_map(extract_number).collect();
    if nums.len() != 4 {
        return None;
    }
    Some(((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()))
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_box_size() {
        let mb = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Real(792.0),
        ]);
        assert_eq!(media_box_size(&mb), Some((612.0, 792.0)));

        let short = Object::Array(vec![Object::Integer(0)]);
        assert_eq!(media_box_size(&short), None);
    }
}
