//! Page rendering for thumbnails
//!
//! pdfium does the real work when the `thumbnails` feature is on and the
//! library can be found; otherwise pages are shown as blank outlines.

use pdf_arrange::{OutlineRenderer, PageRenderingService};
use std::sync::Arc;

#[cfg(feature = "thumbnails")]
use image::RgbaImage;
#[cfg(feature = "thumbnails")]
use pdf_arrange::{ArrangeError, RasterImage, RenderDocument};
#[cfg(feature = "thumbnails")]
use pdfium_render::prelude::*;

/// Initialize Pdfium, trying the vendored library first, then falling back to system
#[cfg(feature = "thumbnails")]
pub fn init_pdfium() -> Result<Pdfium, PdfiumError> {
    // Try to load from vendor directory (relative to workspace root)
    let vendor_path = std::env::current_dir().ok().and_then(|mut p| {
        p.push("vendor/pdfium/lib");
        if p.exists() { Some(p) } else { None }
    });

    if let Some(vendor_path) = vendor_path {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&vendor_path))
        {
            return Ok(Pdfium::new(binding));
        }
    }

    // Fallback to system library or default search paths
    Pdfium::bind_to_system_library().map(Pdfium::new)
}

/// Renders pages with pdfium. The library is bound once per document
/// since pdfium handles must stay on the thread that created them.
#[cfg(feature = "thumbnails")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRenderer;

#[cfg(feature = "thumbnails")]
impl PageRenderingService for PdfiumRenderer {
    fn with_document(
        &self,
        bytes: &[u8],
        visit: &mut dyn FnMut(&dyn RenderDocument) -> pdf_arrange::Result<()>,
    ) -> pdf_arrange::Result<()> {
        let load_failure = |e: PdfiumError| ArrangeError::LoadFailure(e.to_string());

        let pdfium = init_pdfium().map_err(load_failure)?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(load_failure)?;

        visit(&PdfiumDocument { document })
    }
}

#[cfg(feature = "thumbnails")]
struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

#[cfg(feature = "thumbnails")]
impl RenderDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn render_page(&self, page_number: u32, scale: f32) -> pdf_arrange::Result<RasterImage> {
        let render_failure = |e: PdfiumError| ArrangeError::RenderFailure(e.to_string());

        let index = page_number
            .checked_sub(1)
            .ok_or_else(|| ArrangeError::RenderFailure("page numbers start at 1".to_string()))?;

        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(render_failure)?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&config).map_err(render_failure)?;

        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let image = RgbaImage::from_raw(width, height, bitmap.as_rgba_bytes().to_vec())
            .ok_or_else(|| {
                ArrangeError::RenderFailure(format!("bitmap does not match {width}x{height}"))
            })?;

        Ok(RasterImage::new(image))
    }
}

/// Pick the best renderer available on this machine
pub fn default_renderer() -> Arc<dyn PageRenderingService> {
    #[cfg(feature = "thumbnails")]
    {
        match init_pdfium() {
            Ok(_) => {
                log::info!("Rendering thumbnails with pdfium");
                return Arc::new(PdfiumRenderer);
            }
            Err(e) => {
                log::warn!("pdfium unavailable ({}), showing page outlines instead", e);
            }
        }
    }

    Arc::new(OutlineRenderer)
}
